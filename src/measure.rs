//! Scoped wall-clock timing.
//!
//! [`ScopedTimer`] is a guard that records elapsed time into a
//! caller-visible [`ElapsedCell`] when it goes out of scope — on every exit
//! path, including early `?` returns. This is how strategies and the harness
//! measure a span without sprinkling `Instant::now()` pairs around each
//! return site.
//!
//! # Example
//!
//! ```
//! use savebench::measure::{ElapsedCell, ScopedTimer};
//!
//! let slot = ElapsedCell::new();
//! {
//!     let _timer = ScopedTimer::new(&slot);
//!     // ... timed work ...
//! }
//! assert!(slot.get().is_some());
//! ```

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A result slot a [`ScopedTimer`] writes into when it is released.
#[derive(Debug, Default)]
pub struct ElapsedCell {
    elapsed: Cell<Option<Duration>>,
}

impl ElapsedCell {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded duration, once a timer has been released into the slot.
    pub fn get(&self) -> Option<Duration> {
        self.elapsed.get()
    }

    /// The recorded duration, or zero if no timer has finished yet.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get().unwrap_or_default()
    }
}

/// A guard measuring the wall-clock span of its own lifetime.
///
/// Dropping the timer — whether by falling off the end of the scope, an
/// early `return`, or a `?` propagation — records the elapsed time into the
/// slot it was created with.
#[derive(Debug)]
pub struct ScopedTimer<'a> {
    slot: &'a ElapsedCell,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    /// Start timing now, recording into `slot` on release.
    pub fn new(slot: &'a ElapsedCell) -> Self {
        Self {
            slot,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.slot.elapsed.set(Some(self.start.elapsed()));
    }
}
