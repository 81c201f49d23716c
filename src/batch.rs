//! The in-memory data model: pixel formats, indexed images, and batches.
//!
//! An [`ImageBatch`] is an ordered, read-only collection of [`IndexedImage`]
//! values produced once per benchmark run. It is backed by an [`Arc`] so a
//! batch can be cloned cheaply and shared across worker threads — no
//! strategy mutates an image, so reads need no synchronization.
//!
//! Whether a batch knows its own length is decided at construction time and
//! recorded as a [`Cardinality`]: materialized generators declare
//! [`Cardinality::Known`], streaming decoders declare
//! [`Cardinality::Unknown`].

use std::sync::Arc;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::SaveBenchError;

/// Pixel format of generated or decoded images.
///
/// All formats use 8-bit samples; the variants differ only in channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit grayscale (1 channel).
    Gray8,
    /// 8-bit RGB (3 channels). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA (4 channels).
    Rgba8,
}

impl PixelFormat {
    /// Number of 8-bit channels per pixel.
    pub fn channel_count(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// Map a channel count (1, 3, or 4) to a pixel format.
    pub fn from_channel_count(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::Gray8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    /// Byte length of one tightly-packed frame at the given dimensions.
    pub fn frame_len(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.channel_count()
    }
}

/// One raw image tagged with its zero-based sequence index.
///
/// The index is assigned by the source at the moment the image is produced,
/// monotonically increasing from zero with no gaps and no reuse. It is the
/// sole source of truth for output naming — it is never reassigned and never
/// inferred from completion order.
#[derive(Debug, Clone)]
pub struct IndexedImage {
    index: u64,
    image: DynamicImage,
}

impl IndexedImage {
    /// Wrap an already-decoded image with its sequence index.
    pub fn new(index: u64, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// Build an image from a tightly-packed raw sample buffer.
    ///
    /// Returns [`SaveBenchError::Source`] when the buffer length does not
    /// match `width * height * channels` for the given format.
    pub fn from_raw(
        index: u64,
        width: u32,
        height: u32,
        format: PixelFormat,
        buffer: Vec<u8>,
    ) -> Result<Self, SaveBenchError> {
        let expected = format.frame_len(width, height);
        if buffer.len() != expected {
            return Err(SaveBenchError::Source(format!(
                "frame {index} has {} bytes, expected {expected} for {width}x{height} {format:?}",
                buffer.len(),
            )));
        }

        // Length was checked above, so from_raw cannot fail.
        let image = match format {
            PixelFormat::Gray8 => GrayImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageLuma8),
            PixelFormat::Rgb8 => {
                RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8)
            }
            PixelFormat::Rgba8 => {
                RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
            }
        }
        .ok_or_else(|| {
            SaveBenchError::Source(format!("failed to construct image for frame {index}"))
        })?;

        Ok(Self { index, image })
    }

    /// The zero-based sequence index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The decoded pixel data.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Whether a batch's length was known when it was constructed.
///
/// Strategies must not pre-size anything from a [`Cardinality::Unknown`]
/// batch, and progress frontends must render without a target total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The source declared its length up front (synthetic generator).
    Known(usize),
    /// The source streamed until exhaustion (external decoder).
    Unknown,
}

impl Cardinality {
    /// The declared total, if there is one.
    pub fn total(self) -> Option<u64> {
        match self {
            Cardinality::Known(count) => Some(count as u64),
            Cardinality::Unknown => None,
        }
    }
}

/// An ordered, finite, read-only collection of images for one benchmark run.
///
/// Cloning a batch is cheap (the images live behind an [`Arc`]) and every
/// clone observes the same immutable contents, which is what lets the
/// concurrent strategies hand the batch to worker threads and offloaded
/// tasks without copying pixel data.
#[derive(Debug, Clone)]
pub struct ImageBatch {
    images: Arc<Vec<IndexedImage>>,
    cardinality: Cardinality,
}

impl ImageBatch {
    /// Build a batch from pre-materialized images with a known cardinality.
    pub fn from_images(images: Vec<IndexedImage>) -> Self {
        let cardinality = Cardinality::Known(images.len());
        Self {
            images: Arc::new(images),
            cardinality,
        }
    }

    /// Drain a streaming source whose length is not known ahead of
    /// consumption.
    ///
    /// The batch still ends up materialized — strategies need random access —
    /// but it keeps the [`Cardinality::Unknown`] tag so nothing downstream
    /// assumes a pre-known total.
    pub fn from_stream(source: impl Iterator<Item = IndexedImage>) -> Self {
        Self {
            images: Arc::new(source.collect()),
            cardinality: Cardinality::Unknown,
        }
    }

    /// The images, in index order.
    pub fn images(&self) -> &[IndexedImage] {
        &self.images
    }

    /// Number of images actually held.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// `true` when the batch holds no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The cardinality declared at construction time.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
}
