//! Progress observation across strategies.
//!
//! Every strategy emits exactly one completion signal per finished item,
//! from whichever worker finished it. [`ProgressObserver`] is the seam those
//! signals flow through; [`ProgressCounter`] is the reference implementation
//! whose atomic count is the property the test suite checks. Rendering
//! (a terminal bar, a log line) is a side effect layered on top of the
//! counting and has no bearing on counting correctness.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use savebench::{ProgressCounter, ProgressObserver};
//!
//! let counter = Arc::new(ProgressCounter::new());
//! counter.on_item_complete();
//! counter.on_item_complete();
//! assert_eq!(counter.count(), 2);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for receiving per-item completion signals.
///
/// Implementations must be [`Send`] and [`Sync`]:
/// [`on_item_complete`](ProgressObserver::on_item_complete) is invoked from
/// whichever worker thread or offloaded task finishes an item, in arbitrary
/// order, and must synchronize internally.
pub trait ProgressObserver: Send + Sync {
    /// A new strategy run is about to start.
    ///
    /// `total` is the declared batch cardinality, or `None` when the source
    /// streamed without a pre-known length. Terminal frontends use this to
    /// reset between runs; the default implementation does nothing.
    fn on_run_start(&self, label: &str, total: Option<u64>) {
        let _ = (label, total);
    }

    /// One item's write has finished. Called once per completed item.
    fn on_item_complete(&self);

    /// The current strategy run has finished (successfully or not).
    fn on_run_finish(&self) {}
}

/// A no-op observer that discards all signals.
///
/// This is the default when no observer is configured.
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl ProgressObserver for NoOpObserver {
    fn on_item_complete(&self) {}
}

/// A thread-safe completion counter.
///
/// The increment is the only operation in the system requiring atomicity;
/// everything else is immutable or exclusively owned by one worker.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    completed: AtomicU64,
}

impl ProgressCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many items have completed so far.
    pub fn count(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

impl ProgressObserver for ProgressCounter {
    fn on_item_complete(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}
