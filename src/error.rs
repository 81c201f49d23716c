//! Error types for the `savebench` crate.
//!
//! This module defines [`SaveBenchError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem without additional logging at the call site —
//! persist failures name the item index and target path, destination
//! failures name the directory that could not be created.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `savebench` operations.
///
/// Every public method that can fail returns `Result<T, SaveBenchError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SaveBenchError {
    /// The image source could not produce an item (malformed frame size,
    /// decoder handshake failure, ...).
    #[error("Image source error: {0}")]
    Source(String),

    /// The external decoder process could not be started.
    #[error("Failed to spawn decoder for {path}: {reason}")]
    DecoderSpawn {
        /// The media file handed to the decoder.
        path: PathBuf,
        /// Underlying reason the spawn failed.
        reason: String,
    },

    /// The destination directory could not be created.
    #[error("Failed to create destination directory {path}: {source}")]
    Destination {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// Encoding or writing a single image failed.
    #[error("Failed to persist image {index} to {path}: {reason}")]
    Persist {
        /// Sequence index of the image that failed.
        index: u64,
        /// Path the image was being written to.
        path: PathBuf,
        /// Underlying codec or I/O failure.
        reason: String,
    },

    /// The worker pool could not be built, or a worker panicked.
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// An I/O error outside the persist path.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}
