//! # savebench
//!
//! Micro-benchmark comparing concurrency strategies for encoding and saving
//! a batch of in-memory images to disk.
//!
//! `savebench` builds one batch of images — synthetic random noise, or
//! frames piped out of an external decoder process — then runs the same
//! encode-and-persist operation over the batch under three interchangeable
//! strategies and reports relative throughput:
//!
//! - [`Sequential`] — one item at a time on the calling thread (baseline).
//! - [`WorkerPool`] — a bounded rayon pool sized to the host's parallelism.
//! - [`CooperativeOffload`] — a single control flow offloading each item to
//!   a blocking pool and awaiting all of them in one place.
//!
//! ## Quick start
//!
//! ```no_run
//! use savebench::{
//!     BenchmarkConfig, ImageBatch, PixelFormat, StrategyOptions, generate, run_benchmark,
//! };
//!
//! let batch = ImageBatch::from_images(generate(100, 512, 512, PixelFormat::Rgb8).collect());
//! let report = run_benchmark(
//!     &batch,
//!     "bench_output".as_ref(),
//!     &BenchmarkConfig::new(),
//!     &StrategyOptions::new(),
//! )?;
//!
//! for line in report.summary_lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), savebench::SaveBenchError>(())
//! ```
//!
//! ## Running a single strategy
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use savebench::{
//!     Destination, DiskEncoder, ImageBatch, OutputFormat, PixelFormat, SaveStrategy,
//!     StrategyOptions, WorkerPool, generate,
//! };
//!
//! let batch = ImageBatch::from_images(generate(100, 256, 256, PixelFormat::Rgb8).collect());
//! let destination = Destination::new("frames", OutputFormat::Png);
//! let result = WorkerPool.run(
//!     &batch,
//!     Arc::new(DiskEncoder),
//!     &destination,
//!     &StrategyOptions::new().with_threads(4),
//! )?;
//! println!("saved {} images in {:?}", result.completed(), result.elapsed());
//! # Ok::<(), savebench::SaveBenchError>(())
//! ```
//!
//! Output files are named `image_{index}.{ext}` where the index is the
//! image's generation-time sequence index — never its completion order.

pub mod batch;
pub mod bench;
pub mod destination;
pub mod encode;
pub mod error;
pub mod generate;
pub mod measure;
pub mod progress;
pub mod strategy;
pub mod stream;

pub use batch::{Cardinality, ImageBatch, IndexedImage, PixelFormat};
pub use bench::{
    BASELINE_STRATEGY, BenchmarkConfig, BenchmarkReport, Speedup, StrategyTiming, run_benchmark,
    speedup,
};
pub use destination::{Destination, OutputFormat};
pub use encode::{DiskEncoder, PersistImage};
pub use error::SaveBenchError;
pub use generate::generate;
pub use progress::{NoOpObserver, ProgressCounter, ProgressObserver};
pub use strategy::{
    CooperativeOffload, SaveStrategy, Sequential, StrategyOptions, StrategyResult, WorkerPool,
};
pub use stream::FrameStream;
