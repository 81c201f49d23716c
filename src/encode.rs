//! The encode-and-persist operation.
//!
//! [`PersistImage`] is the opaque, synchronous, fallible unit of work every
//! strategy applies to every item of a batch. The production implementation,
//! [`DiskEncoder`], delegates encoding to the `image` crate (chosen by the
//! destination's file extension) and writes the result to the derived path.
//!
//! Keeping this behind a trait is what lets tests instrument failures (for
//! example "fail on index 3") without touching any strategy code.

use crate::batch::IndexedImage;
use crate::destination::Destination;
use crate::error::SaveBenchError;

/// One encode-and-persist unit of work.
///
/// Implementations must be [`Send`] and [`Sync`] — the same operation value
/// is shared, unchanged, by every strategy and may be invoked from many
/// worker threads at once.
pub trait PersistImage: Send + Sync {
    /// Encode `image` into the destination's container format and write it
    /// to [`Destination::path_for`]`(image.index())`.
    fn persist(
        &self,
        image: &IndexedImage,
        destination: &Destination,
    ) -> Result<(), SaveBenchError>;
}

/// Production persist operation: encode via the `image` crate, write to disk.
///
/// The codec is treated as an opaque black box; any rejection (unsupported
/// colour type for the format, I/O failure, disk full) surfaces as
/// [`SaveBenchError::Persist`] carrying the item index and target path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskEncoder;

impl PersistImage for DiskEncoder {
    fn persist(
        &self,
        image: &IndexedImage,
        destination: &Destination,
    ) -> Result<(), SaveBenchError> {
        let path = destination.path_for(image.index());
        image
            .image()
            .save(&path)
            .map_err(|error| SaveBenchError::Persist {
                index: image.index(),
                path,
                reason: error.to_string(),
            })
    }
}
