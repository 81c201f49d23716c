//! Synthetic image source: uniform random noise.

use rand::RngCore;

use crate::batch::{IndexedImage, PixelFormat};

/// Produce a lazy, finite sequence of `count` noise images.
///
/// Each image is `width × height` with 8-bit samples in the channel layout
/// of `format`, filled with uniform random bytes. Sequence indices are
/// assigned at the moment each image is produced, monotonically increasing
/// from zero with no gaps.
///
/// The sequence is restartable: a fresh call yields a fresh, independent
/// sequence with fresh random content.
///
/// # Example
///
/// ```
/// use savebench::{ImageBatch, PixelFormat, generate};
///
/// let batch = ImageBatch::from_images(generate(10, 64, 64, PixelFormat::Rgb8).collect());
/// assert_eq!(batch.len(), 10);
/// ```
pub fn generate(
    count: u64,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> impl Iterator<Item = IndexedImage> {
    (0..count).map(move |index| {
        let mut buffer = vec![0_u8; format.frame_len(width, height)];
        rand::rng().fill_bytes(&mut buffer);
        // The buffer is sized exactly for the dimensions, so this cannot fail.
        IndexedImage::from_raw(index, width, height, format, buffer)
            .expect("noise buffer length matches dimensions")
    })
}
