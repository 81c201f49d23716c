//! Execution strategies: three interchangeable drivers that apply one
//! encode-and-persist operation to every item of a batch.
//!
//! All strategies share the same contract, [`SaveStrategy::run`]: create the
//! destination directory idempotently before any write, invoke the operation
//! exactly once per image, signal the progress observer as each item's write
//! finishes, and return a [`StrategyResult`] whose elapsed time spans from
//! the first invocation attempt to the last completion, including pool
//! teardown.
//!
//! They differ only in scheduling:
//!
//! - [`Sequential`] — index order on the calling thread, fail-fast.
//! - [`WorkerPool`] — a bounded rayon pool; items complete in arbitrary
//!   order; every unit settles before the first error is surfaced.
//! - [`CooperativeOffload`] — a single control flow offloading each item to
//!   tokio's blocking pool and awaiting all handles in one place. For
//!   CPU-bound encoding this is deliberately near-identical to
//!   [`WorkerPool`]: cooperative scheduling without extra parallelism is not
//!   a speedup mechanism, and the benchmark exists to show that.
//!
//! Nothing here is cancellable mid-flight and there are no timeouts — a
//! hung persist call hangs the strategy run.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::batch::ImageBatch;
use crate::destination::Destination;
use crate::encode::PersistImage;
use crate::error::SaveBenchError;
use crate::measure::{ElapsedCell, ScopedTimer};
use crate::progress::{NoOpObserver, ProgressObserver};

/// Per-run settings threaded through [`SaveStrategy::run`].
///
/// Carries the progress observer and the worker-pool size override without
/// polluting every strategy signature. A default-constructed value uses a
/// no-op observer and sizes pools to the host's available parallelism.
#[derive(Clone)]
pub struct StrategyOptions {
    progress: Arc<dyn ProgressObserver>,
    threads: Option<usize>,
}

impl Debug for StrategyOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StrategyOptions")
            .field("threads", &self.threads)
            .finish()
    }
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpObserver),
            threads: None,
        }
    }

    /// Attach a progress observer.
    ///
    /// The observer receives one [`ProgressObserver::on_item_complete`]
    /// signal per finished item, from whichever worker finished it.
    #[must_use]
    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = observer;
        self
    }

    /// Override the worker-pool size for the concurrent strategies.
    ///
    /// Defaults to the host's available parallelism. Ignored by
    /// [`Sequential`]. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// The configured progress observer.
    pub fn progress(&self) -> &Arc<dyn ProgressObserver> {
        &self.progress
    }

    /// The effective pool size: the override, or the host's parallelism.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1)
        })
    }
}

/// Outcome of one full batch run under one strategy.
///
/// Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyResult {
    elapsed: Duration,
    completed: u64,
}

impl StrategyResult {
    fn new(elapsed: Duration, completed: u64) -> Self {
        Self { elapsed, completed }
    }

    /// Wall-clock time for the full run, including pool teardown.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// How many items were persisted.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Mean time per item, when at least one item completed.
    pub fn per_item(&self) -> Option<Duration> {
        (self.completed > 0).then(|| self.elapsed / self.completed as u32)
    }
}

/// The shared contract every execution strategy implements.
pub trait SaveStrategy: Send + Sync {
    /// Short human-readable name used in reports ("sequential", ...).
    fn label(&self) -> &'static str;

    /// Apply `operation` to every image in `batch`, writing into
    /// `destination`.
    ///
    /// Postconditions on success: the operation was invoked exactly once per
    /// image, one progress signal was emitted per finished item, and the
    /// returned result's completed count equals the batch length.
    fn run(
        &self,
        batch: &ImageBatch,
        operation: Arc<dyn PersistImage>,
        destination: &Destination,
        options: &StrategyOptions,
    ) -> Result<StrategyResult, SaveBenchError>;
}

/// Baseline: one item at a time, in index order, on the calling thread.
///
/// Fails fast — the first persist error aborts the run, leaving earlier
/// indices written and later indices untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl SaveStrategy for Sequential {
    fn label(&self) -> &'static str {
        "sequential"
    }

    fn run(
        &self,
        batch: &ImageBatch,
        operation: Arc<dyn PersistImage>,
        destination: &Destination,
        options: &StrategyOptions,
    ) -> Result<StrategyResult, SaveBenchError> {
        destination.ensure_exists()?;

        let slot = ElapsedCell::new();
        let completed = {
            let _timer = ScopedTimer::new(&slot);
            let mut completed = 0_u64;
            for image in batch.images() {
                operation.persist(image, destination)?;
                options.progress().on_item_complete();
                completed += 1;
            }
            completed
        };

        Ok(StrategyResult::new(slot.elapsed(), completed))
    }
}

/// Bounded worker pool: every item dispatched to a dedicated rayon pool.
///
/// Items are submitted in index order and complete in arbitrary order. The
/// run drains gracefully: all submitted units settle before the first
/// failure (by submission order) is surfaced, so no worker is left in a
/// partially-drained state. Queue depth is bounded only by batch size —
/// acceptable here because the batch is already materialized in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool;

impl SaveStrategy for WorkerPool {
    fn label(&self) -> &'static str {
        "worker-pool"
    }

    fn run(
        &self,
        batch: &ImageBatch,
        operation: Arc<dyn PersistImage>,
        destination: &Destination,
        options: &StrategyOptions,
    ) -> Result<StrategyResult, SaveBenchError> {
        destination.ensure_exists()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.thread_count())
            .build()
            .map_err(|error| SaveBenchError::Pool(error.to_string()))?;

        let slot = ElapsedCell::new();
        let outcomes: Vec<Result<(), SaveBenchError>> = {
            let _timer = ScopedTimer::new(&slot);
            let outcomes = pool.install(|| {
                batch
                    .images()
                    .par_iter()
                    .map(|image| {
                        operation
                            .persist(image, destination)
                            .map(|()| options.progress().on_item_complete())
                    })
                    .collect()
            });
            // Pool teardown belongs to the measured span.
            drop(pool);
            outcomes
        };

        let completed = outcomes.iter().filter(|outcome| outcome.is_ok()).count() as u64;
        if let Some(error) = outcomes.into_iter().find_map(Result::err) {
            return Err(error);
        }

        Ok(StrategyResult::new(slot.elapsed(), completed))
    }
}

/// Cooperative offload: a single control flow on a current-thread tokio
/// runtime, offloading each item's blocking persist call to the runtime's
/// blocking pool and awaiting all handles in one coordinating wait.
///
/// Functionally equivalent to [`WorkerPool`] for this CPU-bound workload —
/// the difference is only in how the caller awaits completion, not in
/// execution parallelism.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeOffload;

impl SaveStrategy for CooperativeOffload {
    fn label(&self) -> &'static str {
        "cooperative-offload"
    }

    fn run(
        &self,
        batch: &ImageBatch,
        operation: Arc<dyn PersistImage>,
        destination: &Destination,
        options: &StrategyOptions,
    ) -> Result<StrategyResult, SaveBenchError> {
        destination.ensure_exists()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .max_blocking_threads(options.thread_count())
            .build()
            .map_err(|error| SaveBenchError::Pool(error.to_string()))?;

        let slot = ElapsedCell::new();
        let outcomes: Vec<Result<(), SaveBenchError>> = {
            let _timer = ScopedTimer::new(&slot);

            let handles: Vec<_> = (0..batch.len())
                .map(|position| {
                    let batch = batch.clone();
                    let operation = Arc::clone(&operation);
                    let destination = destination.clone();
                    let progress = Arc::clone(options.progress());
                    runtime.spawn_blocking(move || {
                        let image = &batch.images()[position];
                        operation
                            .persist(image, &destination)
                            .map(|()| progress.on_item_complete())
                    })
                })
                .collect();

            let outcomes = runtime.block_on(async {
                let mut outcomes = Vec::with_capacity(handles.len());
                for handle in handles {
                    outcomes.push(match handle.await {
                        Ok(outcome) => outcome,
                        Err(join_error) => Err(SaveBenchError::Pool(join_error.to_string())),
                    });
                }
                outcomes
            });
            // Blocking-pool teardown belongs to the measured span.
            drop(runtime);
            outcomes
        };

        let completed = outcomes.iter().filter(|outcome| outcome.is_ok()).count() as u64;
        if let Some(error) = outcomes.into_iter().find_map(Result::err) {
            return Err(error);
        }

        Ok(StrategyResult::new(slot.elapsed(), completed))
    }
}
