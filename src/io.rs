//! Decode/encode collaborators at the edge of the pipeline.
//!
//! The engine itself never touches files; input and output nodes go through
//! these traits, which preserve the empty-sentinel convention (a failed
//! decode is an error, never a partial buffer).

use crate::payload::ImageBuffer;
use image::ImageEncoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Mutex;

/// Errors from image sources and sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageIoError {
    /// No image stored/readable at the given path
    NotFound(String),
    /// Decoding the stored bytes failed
    Decode(String),
    /// Encoding or writing failed
    Encode(String),
    /// Attempted to save the empty sentinel
    EmptyPayload,
    /// Payload shape the codec cannot represent
    UnsupportedChannels(u8),
}

impl std::fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageIoError::NotFound(path) => write!(f, "No image at {}", path),
            ImageIoError::Decode(msg) => write!(f, "Decode failed: {}", msg),
            ImageIoError::Encode(msg) => write!(f, "Encode failed: {}", msg),
            ImageIoError::EmptyPayload => write!(f, "Refusing to save an empty payload"),
            ImageIoError::UnsupportedChannels(count) => {
                write!(f, "Cannot encode {}-channel payload", count)
            }
        }
    }
}

impl std::error::Error for ImageIoError {}

/// Encoding format for saved images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Bmp,
    /// JPEG with quality 0-100
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Supplies payloads by path (file decode, in the file-backed impl).
pub trait ImageSource {
    fn load(&self, path: &str) -> Result<ImageBuffer, ImageIoError>;
}

/// Persists payloads by path.
pub trait ImageSink {
    fn save(&self, path: &str, format: OutputFormat, image: &ImageBuffer)
        -> Result<(), ImageIoError>;
}

/// In-memory source + sink for tests: loads from a seeded map, records saves.
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    images: HashMap<String, ImageBuffer>,
    saved: Mutex<HashMap<String, ImageBuffer>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an image the source side will serve.
    pub fn insert(&mut self, path: impl Into<String>, image: ImageBuffer) {
        self.images.insert(path.into(), image);
    }

    /// Returns a payload previously written through the sink side.
    pub fn saved(&self, path: &str) -> Option<ImageBuffer> {
        self.saved.lock().expect("image store poisoned").get(path).cloned()
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().expect("image store poisoned").len()
    }
}

impl ImageSource for InMemoryImageStore {
    fn load(&self, path: &str) -> Result<ImageBuffer, ImageIoError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| ImageIoError::NotFound(path.to_string()))
    }
}

impl ImageSink for InMemoryImageStore {
    fn save(
        &self,
        path: &str,
        _format: OutputFormat,
        image: &ImageBuffer,
    ) -> Result<(), ImageIoError> {
        if image.is_empty() {
            return Err(ImageIoError::EmptyPayload);
        }
        self.saved
            .lock()
            .expect("image store poisoned")
            .insert(path.to_string(), image.clone());
        Ok(())
    }
}

/// File-backed source decoding through the `image` crate.
///
/// Single-channel files load as one-channel payloads; everything else is
/// converted to three-channel RGB.
#[derive(Debug, Default)]
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, path: &str) -> Result<ImageBuffer, ImageIoError> {
        let decoded = image::open(path).map_err(|err| ImageIoError::Decode(err.to_string()))?;

        let buffer = if decoded.color().channel_count() == 1 {
            let gray = decoded.to_luma8();
            ImageBuffer::from_raw(gray.width(), gray.height(), 1, gray.into_raw())
        } else {
            let rgb = decoded.to_rgb8();
            ImageBuffer::from_raw(rgb.width(), rgb.height(), 3, rgb.into_raw())
        };
        buffer.map_err(|err| ImageIoError::Decode(err.to_string()))
    }
}

/// File-backed sink encoding through the `image` crate.
#[derive(Debug, Default)]
pub struct FileImageSink;

impl ImageSink for FileImageSink {
    fn save(
        &self,
        path: &str,
        format: OutputFormat,
        image: &ImageBuffer,
    ) -> Result<(), ImageIoError> {
        if image.is_empty() {
            return Err(ImageIoError::EmptyPayload);
        }

        let (width, height) = (image.width(), image.height());
        let color_type = match image.channels() {
            1 => image::ExtendedColorType::L8,
            3 => image::ExtendedColorType::Rgb8,
            other => return Err(ImageIoError::UnsupportedChannels(other)),
        };

        let file = File::create(path).map_err(|err| ImageIoError::Encode(err.to_string()))?;
        let mut writer = BufWriter::new(file);

        let result = match format {
            OutputFormat::Jpeg { quality } => {
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality)
                    .encode(image.data(), width, height, color_type)
            }
            OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut writer).write_image(
                image.data(),
                width,
                height,
                color_type,
            ),
            OutputFormat::Bmp => image::codecs::bmp::BmpEncoder::new(&mut writer).encode(
                image.data(),
                width,
                height,
                color_type,
            ),
        };
        result.map_err(|err| ImageIoError::Encode(err.to_string()))
    }
}
