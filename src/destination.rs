//! Output destinations: target directory, container format, path derivation.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SaveBenchError;

/// Target container format for persisted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpg,
}

impl OutputFormat {
    /// File extension used for derived paths (also selects the codec when
    /// saving through the `image` crate).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }

    /// Parse a format name. Accepts the usual aliases, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpg),
            _ => None,
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpg => "JPG",
        })
    }
}

/// Where one strategy run writes its output: a directory plus a format.
///
/// Per-item paths are derived deterministically from the image's sequence
/// index as `{dir}/image_{index}.{ext}`.
#[derive(Debug, Clone)]
pub struct Destination {
    dir: PathBuf,
    format: OutputFormat,
}

impl Destination {
    /// Create a destination rooted at `dir` writing `format` files.
    ///
    /// The directory is not touched here; strategies call
    /// [`ensure_exists`](Destination::ensure_exists) before dispatching work.
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// The destination directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The container format written into this destination.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Derive the output path for the image with the given sequence index.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir
            .join(format!("image_{index}.{}", self.format.extension()))
    }

    /// Create the destination directory, recursively and idempotently.
    ///
    /// Creating an already-existing directory is not an error, and the call
    /// is safe to race between strategies.
    pub fn ensure_exists(&self) -> Result<(), SaveBenchError> {
        fs::create_dir_all(&self.dir).map_err(|source| SaveBenchError::Destination {
            path: self.dir.clone(),
            source,
        })
    }
}
