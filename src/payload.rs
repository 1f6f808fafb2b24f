use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a payload from raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Data length does not match width * height * channels
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
    /// Zero-sized dimension or unsupported channel count
    InvalidDimensions(String),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {} bytes, got {}", expected, actual)
            }
            PayloadError::InvalidDimensions(msg) => write!(f, "Invalid dimensions: {}", msg),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Image payload passed between pipeline nodes.
///
/// Pixels are stored interleaved, row-major, one `u8` per sample. The engine
/// treats this as an opaque value; only the transform stages look inside.
///
/// The canonical "no valid data" sentinel is a buffer with zero dimensions
/// (`ImageBuffer::empty()`), which `is_empty()` detects. Failed stages emit
/// the sentinel so downstream stages can short-circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Creates the empty sentinel buffer.
    pub fn empty() -> Self {
        ImageBuffer {
            width: 0,
            height: 0,
            channels: 0,
            data: Vec::new(),
        }
    }

    /// Creates a zero-filled buffer with the given dimensions.
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        let len = width as usize * height as usize * channels as usize;
        ImageBuffer {
            width,
            height,
            channels,
            data: vec![0; len],
        }
    }

    /// Creates a buffer filled with a single sample value. Mostly useful in tests.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let len = width as usize * height as usize * channels as usize;
        ImageBuffer {
            width,
            height,
            channels,
            data: vec![value; len],
        }
    }

    /// Creates a buffer from raw interleaved samples.
    ///
    /// # Errors
    /// Returns an error if the data length does not match the dimensions,
    /// or if any dimension is zero (the empty sentinel is constructed via
    /// `empty()`, never through this constructor).
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, PayloadError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(PayloadError::InvalidDimensions(format!(
                "{}x{}x{}",
                width, height, channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PayloadError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(ImageBuffer {
            width,
            height,
            channels,
            data,
        })
    }

    /// Returns true if this buffer is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn index(&self, x: u32, y: u32, channel: u8) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize + channel as usize
    }

    /// Sample at (x, y) for one channel. Out-of-range coordinates return 0.
    pub fn sample(&self, x: u32, y: u32, channel: u8) -> u8 {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return 0;
        }
        self.data[self.index(x, y, channel)]
    }

    /// Writes one sample. Out-of-range coordinates are ignored.
    pub fn set_sample(&mut self, x: u32, y: u32, channel: u8, value: u8) {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return;
        }
        let idx = self.index(x, y, channel);
        self.data[idx] = value;
    }

    /// Sample with coordinates clamped to the image border (replicate padding).
    pub fn sample_clamped(&self, x: i64, y: i64, channel: u8) -> u8 {
        if self.is_empty() {
            return 0;
        }
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.sample(cx, cy, channel)
    }

    /// Converts to a single-channel grayscale buffer using rec.601 luma weights.
    ///
    /// Single-channel input is returned as a clone; buffers with two or more
    /// channels average the first three (or fewer) weighted channels.
    pub fn to_gray(&self) -> ImageBuffer {
        if self.is_empty() {
            return ImageBuffer::empty();
        }
        if self.channels == 1 {
            return self.clone();
        }
        let mut gray = ImageBuffer::new(self.width, self.height, 1);
        for y in 0..self.height {
            for x in 0..self.width {
                let luma = if self.channels >= 3 {
                    let r = self.sample(x, y, 0) as f64;
                    let g = self.sample(x, y, 1) as f64;
                    let b = self.sample(x, y, 2) as f64;
                    0.299 * r + 0.587 * g + 0.114 * b
                } else {
                    // Two-channel data: treat the first channel as intensity.
                    self.sample(x, y, 0) as f64
                };
                gray.set_sample(x, y, 0, luma.round().clamp(0.0, 255.0) as u8);
            }
        }
        gray
    }
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let buffer = ImageBuffer::empty();
        assert!(buffer.is_empty());
        assert_eq!(buffer.width(), 0);
        assert_eq!(buffer.height(), 0);
        assert_eq!(buffer.channels(), 0);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(ImageBuffer::default().is_empty());
    }

    #[test]
    fn test_new_zero_filled() {
        let buffer = ImageBuffer::new(4, 3, 3);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.data().len(), 36);
        assert_eq!(buffer.sample(2, 1, 1), 0);
    }

    #[test]
    fn test_from_raw_rejects_length_mismatch() {
        let result = ImageBuffer::from_raw(2, 2, 1, vec![0; 3]);
        assert_eq!(
            result.unwrap_err(),
            PayloadError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_from_raw_rejects_zero_dimension() {
        let result = ImageBuffer::from_raw(0, 2, 1, vec![]);
        assert!(matches!(result, Err(PayloadError::InvalidDimensions(_))));
    }

    #[test]
    fn test_sample_and_set_sample() {
        let mut buffer = ImageBuffer::new(3, 2, 2);
        buffer.set_sample(2, 1, 1, 200);
        assert_eq!(buffer.sample(2, 1, 1), 200);
        // Out-of-range access is a quiet no-op / zero.
        buffer.set_sample(3, 0, 0, 50);
        assert_eq!(buffer.sample(3, 0, 0), 0);
    }

    #[test]
    fn test_sample_clamped_replicates_border() {
        let buffer = ImageBuffer::from_raw(2, 1, 1, vec![10, 20]).unwrap();
        assert_eq!(buffer.sample_clamped(-5, 0, 0), 10);
        assert_eq!(buffer.sample_clamped(9, 0, 0), 20);
    }

    #[test]
    fn test_to_gray_luma_weights() {
        let buffer = ImageBuffer::from_raw(1, 1, 3, vec![255, 0, 0]).unwrap();
        let gray = buffer.to_gray();
        assert_eq!(gray.channels(), 1);
        // 0.299 * 255 ~= 76
        assert_eq!(gray.sample(0, 0, 0), 76);
    }

    #[test]
    fn test_to_gray_preserves_single_channel() {
        let buffer = ImageBuffer::filled(2, 2, 1, 42);
        let gray = buffer.to_gray();
        assert_eq!(gray, buffer);
    }

    #[test]
    fn test_to_gray_of_empty_is_empty() {
        assert!(ImageBuffer::empty().to_gray().is_empty());
    }
}
