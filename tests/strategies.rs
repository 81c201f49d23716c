//! Strategy contract integration tests: file completeness, naming, progress
//! counting, idempotent directory creation, and failure policies.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use savebench::{
    CooperativeOffload, Destination, DiskEncoder, ImageBatch, IndexedImage, OutputFormat,
    PersistImage, PixelFormat, ProgressCounter, ProgressObserver, SaveBenchError, SaveStrategy,
    Sequential,
    StrategyOptions, WorkerPool, generate,
};

fn small_batch(count: u64) -> ImageBatch {
    ImageBatch::from_images(generate(count, 16, 16, PixelFormat::Rgb8).collect())
}

fn all_strategies() -> Vec<Box<dyn SaveStrategy>> {
    vec![
        Box::new(Sequential),
        Box::new(WorkerPool),
        Box::new(CooperativeOffload),
    ]
}

/// Indices (parsed from `image_{i}.{ext}` names) present in a directory.
fn written_indices(dir: &Path, extension: &str) -> Vec<u64> {
    let mut indices: Vec<u64> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter_map(|name| {
            name.strip_prefix("image_")?
                .strip_suffix(&format!(".{extension}"))?
                .parse()
                .ok()
        })
        .collect();
    indices.sort_unstable();
    indices
}

/// An encode-and-persist operation instrumented to fail at one index.
struct FailAt {
    index: u64,
    inner: DiskEncoder,
}

impl PersistImage for FailAt {
    fn persist(
        &self,
        image: &IndexedImage,
        destination: &Destination,
    ) -> Result<(), SaveBenchError> {
        if image.index() == self.index {
            return Err(SaveBenchError::Persist {
                index: image.index(),
                path: destination.path_for(image.index()),
                reason: "instrumented failure".to_string(),
            });
        }
        self.inner.persist(image, destination)
    }
}

#[test]
fn every_strategy_writes_one_file_per_index() {
    let batch = small_batch(12);

    for strategy in all_strategies() {
        let root = tempfile::tempdir().unwrap();
        let destination = Destination::new(root.path().join("out"), OutputFormat::Png);
        let counter = Arc::new(ProgressCounter::new());
        let options = StrategyOptions::new().with_progress(Arc::clone(&counter) as Arc<dyn ProgressObserver>);

        let result = strategy
            .run(&batch, Arc::new(DiskEncoder), &destination, &options)
            .unwrap();

        assert_eq!(result.completed(), 12, "{}", strategy.label());
        assert_eq!(counter.count(), 12, "{}", strategy.label());
        assert_eq!(
            written_indices(destination.dir(), "png"),
            (0..12).collect::<Vec<u64>>(),
            "{}",
            strategy.label(),
        );
    }
}

#[test]
fn empty_batch_completes_with_zero_items() {
    let batch = small_batch(0);

    for strategy in all_strategies() {
        let root = tempfile::tempdir().unwrap();
        let destination = Destination::new(root.path().join("out"), OutputFormat::Png);

        let result = strategy
            .run(
                &batch,
                Arc::new(DiskEncoder),
                &destination,
                &StrategyOptions::new(),
            )
            .unwrap();

        assert_eq!(result.completed(), 0);
        assert!(destination.dir().is_dir(), "directory is still created");
        assert!(written_indices(destination.dir(), "png").is_empty());
    }
}

#[test]
fn directory_creation_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let destination = Destination::new(root.path().join("out"), OutputFormat::Png);

    destination.ensure_exists().unwrap();
    let unrelated = destination.dir().join("unrelated.txt");
    fs::write(&unrelated, b"keep me").unwrap();

    destination.ensure_exists().unwrap();
    assert_eq!(fs::read(&unrelated).unwrap(), b"keep me");
}

#[test]
fn destination_failure_aborts_the_run() {
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    // A directory cannot be created underneath a regular file.
    let destination = Destination::new(blocker.join("nested"), OutputFormat::Png);
    let outcome = Sequential.run(
        &small_batch(3),
        Arc::new(DiskEncoder),
        &destination,
        &StrategyOptions::new(),
    );
    assert!(matches!(outcome, Err(SaveBenchError::Destination { .. })));
}

#[test]
fn sequential_fails_fast_on_first_persist_error() {
    let batch = small_batch(10);
    let root = tempfile::tempdir().unwrap();
    let destination = Destination::new(root.path().join("out"), OutputFormat::Png);

    let outcome = Sequential.run(
        &batch,
        Arc::new(FailAt {
            index: 3,
            inner: DiskEncoder,
        }),
        &destination,
        &StrategyOptions::new(),
    );

    assert!(matches!(
        outcome,
        Err(SaveBenchError::Persist { index: 3, .. })
    ));
    // Exactly indices 0..=2 were written; nothing at or past the failure.
    assert_eq!(written_indices(destination.dir(), "png"), vec![0, 1, 2]);
}

#[test]
fn concurrent_strategies_drain_before_surfacing_the_failure() {
    let batch = small_batch(10);

    for strategy in [
        Box::new(WorkerPool) as Box<dyn SaveStrategy>,
        Box::new(CooperativeOffload),
    ] {
        let root = tempfile::tempdir().unwrap();
        let destination = Destination::new(root.path().join("out"), OutputFormat::Png);
        let counter = Arc::new(ProgressCounter::new());
        let options = StrategyOptions::new().with_progress(Arc::clone(&counter) as Arc<dyn ProgressObserver>);

        let outcome = strategy.run(
            &batch,
            Arc::new(FailAt {
                index: 3,
                inner: DiskEncoder,
            }),
            &destination,
            &options,
        );

        assert!(
            matches!(outcome, Err(SaveBenchError::Persist { index: 3, .. })),
            "{}",
            strategy.label(),
        );
        // No cancel-on-error: every other item still completed.
        assert_eq!(counter.count(), 9, "{}", strategy.label());
        assert_eq!(
            written_indices(destination.dir(), "png"),
            vec![0, 1, 2, 4, 5, 6, 7, 8, 9],
            "{}",
            strategy.label(),
        );
    }
}

#[test]
fn worker_pool_is_complete_at_any_pool_size() {
    let batch = ImageBatch::from_images(generate(500, 64, 64, PixelFormat::Rgb8).collect());

    for threads in [1, 4, 64] {
        let root = tempfile::tempdir().unwrap();
        let destination = Destination::new(root.path().join("out"), OutputFormat::Png);
        let counter = Arc::new(ProgressCounter::new());
        let options = StrategyOptions::new()
            .with_threads(threads)
            .with_progress(Arc::clone(&counter) as Arc<dyn ProgressObserver>);

        let result = WorkerPool
            .run(&batch, Arc::new(DiskEncoder), &destination, &options)
            .unwrap();

        assert_eq!(result.completed(), 500, "pool size {threads}");
        assert_eq!(counter.count(), 500, "pool size {threads}");
        assert_eq!(
            written_indices(destination.dir(), "png").len(),
            500,
            "pool size {threads}",
        );
    }
}

#[test]
fn cooperative_offload_matches_worker_pool_semantics() {
    let batch = small_batch(50);
    let root = tempfile::tempdir().unwrap();
    let destination = Destination::new(root.path().join("out"), OutputFormat::Jpg);
    let counter = Arc::new(ProgressCounter::new());
    let options = StrategyOptions::new()
        .with_threads(4)
        .with_progress(Arc::clone(&counter) as Arc<dyn ProgressObserver>);

    let result = CooperativeOffload
        .run(&batch, Arc::new(DiskEncoder), &destination, &options)
        .unwrap();

    assert_eq!(result.completed(), 50);
    assert_eq!(counter.count(), 50);
    assert_eq!(
        written_indices(destination.dir(), "jpg"),
        (0..50).collect::<Vec<u64>>(),
    );
}

#[test]
fn unknown_cardinality_batch_runs_without_a_total() {
    // Simulates a streaming source that yields exactly 7 frames before
    // signalling end-of-stream.
    let batch = ImageBatch::from_stream(generate(7, 16, 16, PixelFormat::Rgb8));
    assert_eq!(batch.cardinality().total(), None);

    let root = tempfile::tempdir().unwrap();
    let destination = Destination::new(root.path().join("out"), OutputFormat::Png);
    let counter = Arc::new(ProgressCounter::new());
    let options = StrategyOptions::new().with_progress(Arc::clone(&counter) as Arc<dyn ProgressObserver>);

    let result = WorkerPool
        .run(&batch, Arc::new(DiskEncoder), &destination, &options)
        .unwrap();

    assert_eq!(result.completed(), 7);
    assert_eq!(counter.count(), 7);
    assert_eq!(
        written_indices(destination.dir(), "png"),
        (0..7).collect::<Vec<u64>>(),
    );
}
