//! The benchmark harness: run one batch through every strategy and compare.
//!
//! [`run_benchmark`] is a linear state machine with no back-edges: for each
//! strategy in a fixed declared order (sequential first — it is the
//! baseline), for each output format, run the batch against a
//! strategy-specific destination subdirectory and record the
//! [`StrategyResult`]. Destinations never collide across strategies, so each
//! run's output stays inspectable on its own.
//!
//! A failure in any run aborts the remainder — the comparison is worthless
//! without all of its points, so no partial [`BenchmarkReport`] is produced.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::batch::ImageBatch;
use crate::destination::{Destination, OutputFormat};
use crate::encode::{DiskEncoder, PersistImage};
use crate::error::SaveBenchError;
use crate::strategy::{
    CooperativeOffload, SaveStrategy, Sequential, StrategyOptions, StrategyResult, WorkerPool,
};

/// Label of the strategy every speedup is computed against.
pub const BASELINE_STRATEGY: &str = "sequential";

/// The strategies under comparison, in their fixed run order, each with the
/// destination subdirectory its output is written under.
fn strategies() -> Vec<(Box<dyn SaveStrategy>, &'static str)> {
    vec![
        (Box::new(Sequential), "output_seq"),
        (Box::new(WorkerPool), "output_pool"),
        (Box::new(CooperativeOffload), "output_offload"),
    ]
}

/// What to compare in one harness run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    formats: Vec<OutputFormat>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchmarkConfig {
    /// Compare both container formats (PNG and JPG), as the benchmark was
    /// originally designed to.
    pub fn new() -> Self {
        Self {
            formats: vec![OutputFormat::Png, OutputFormat::Jpg],
        }
    }

    /// Restrict the comparison to the given formats.
    #[must_use]
    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// The formats under comparison.
    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }
}

/// One recorded run: which strategy, which format, how it went.
#[derive(Debug, Clone)]
pub struct StrategyTiming {
    strategy: &'static str,
    format: OutputFormat,
    result: StrategyResult,
}

impl StrategyTiming {
    /// The strategy's label.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    /// The container format of this run.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Timing and completion count.
    pub fn result(&self) -> &StrategyResult {
        &self.result
    }
}

/// A derived speedup ratio against the sequential baseline.
#[derive(Debug, Clone, Copy)]
pub struct Speedup {
    /// The compared strategy's label.
    pub strategy: &'static str,
    /// The format both runs wrote.
    pub format: OutputFormat,
    /// `baseline_time / strategy_time` — above 1.0 means faster than the
    /// baseline.
    pub ratio: f64,
}

/// The speedup of `candidate` relative to `baseline`.
///
/// Pure arithmetic: `baseline / candidate`, no clamping or rounding.
pub fn speedup(baseline: Duration, candidate: Duration) -> f64 {
    baseline.as_secs_f64() / candidate.as_secs_f64()
}

/// Mapping from (strategy, format) to [`StrategyResult`], with derived
/// speedups against the sequential baseline.
///
/// Built once at the end of a harness run; never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    timings: Vec<StrategyTiming>,
}

impl BenchmarkReport {
    /// Every recorded run, in execution order.
    pub fn timings(&self) -> &[StrategyTiming] {
        &self.timings
    }

    /// Look up the result for one (strategy, format) pair.
    pub fn result_for(&self, strategy: &str, format: OutputFormat) -> Option<&StrategyResult> {
        self.timings
            .iter()
            .find(|timing| timing.strategy == strategy && timing.format == format)
            .map(|timing| &timing.result)
    }

    /// Speedup ratios of every non-baseline run against the sequential run
    /// of the same format.
    pub fn speedups(&self) -> Vec<Speedup> {
        self.timings
            .iter()
            .filter(|timing| timing.strategy != BASELINE_STRATEGY)
            .filter_map(|timing| {
                let baseline = self.result_for(BASELINE_STRATEGY, timing.format)?;
                Some(Speedup {
                    strategy: timing.strategy,
                    format: timing.format,
                    ratio: speedup(baseline.elapsed(), timing.result.elapsed()),
                })
            })
            .collect()
    }

    /// Human-readable report lines: per-run timings followed by speedups.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.timings.len() * 2);

        for timing in &self.timings {
            let result = &timing.result;
            let mut line = format!(
                "Execution time {} {} save: {:.4} seconds",
                timing.strategy,
                timing.format,
                result.elapsed().as_secs_f64(),
            );
            if result.completed() > 1 {
                if let Some(per_item) = result.per_item() {
                    line.push_str(&format!(
                        " ({:.6} seconds per image)",
                        per_item.as_secs_f64()
                    ));
                }
            }
            lines.push(line);
        }

        for speedup in self.speedups() {
            lines.push(format!(
                "{} {} save is {:.2} times faster than {BASELINE_STRATEGY}",
                speedup.strategy, speedup.format, speedup.ratio,
            ));
        }

        lines
    }
}

/// Run `batch` through every strategy and format against fresh destinations
/// under `root`, and collect the comparison.
///
/// Each run gets its own `output_*` subdirectory under `root`, created
/// idempotently by the strategy itself. The progress observer configured in
/// `options` receives run-boundary notifications around each run, and one
/// completion signal per persisted item during it.
pub fn run_benchmark(
    batch: &ImageBatch,
    root: &Path,
    config: &BenchmarkConfig,
    options: &StrategyOptions,
) -> Result<BenchmarkReport, SaveBenchError> {
    let operation: Arc<dyn PersistImage> = Arc::new(DiskEncoder);
    let total = batch.cardinality().total();
    let mut report = BenchmarkReport::default();

    for (strategy, subdir) in strategies() {
        for &format in config.formats() {
            let destination = Destination::new(root.join(subdir), format);
            let label = format!("{} {format}", strategy.label());

            options.progress().on_run_start(&label, total);
            let outcome = strategy.run(batch, Arc::clone(&operation), &destination, options);
            options.progress().on_run_finish();

            let result = outcome?;
            log::info!(
                "{label} save: {:.4}s for {} images into {}",
                result.elapsed().as_secs_f64(),
                result.completed(),
                destination.dir().display(),
            );

            report.timings.push(StrategyTiming {
                strategy: strategy.label(),
                format,
                result,
            });
        }
    }

    Ok(report)
}
