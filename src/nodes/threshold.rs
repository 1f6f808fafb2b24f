use crate::diagnostics::DiagnosticSink;
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Thresholding method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Global threshold at the configured value
    Binary,
    /// Local mean over an 11x11 neighborhood, minus a small constant
    Adaptive,
    /// Global threshold chosen by Otsu's between-class variance criterion
    Otsu,
}

/// Binarizes the (grayscaled) input according to the selected method.
pub struct ThresholdNode {
    name: String,
    value: f64,
    method: ThresholdMethod,
    output: ImageBuffer,
}

/// Neighborhood size for the adaptive method.
const ADAPTIVE_BLOCK: i64 = 11;
/// Constant subtracted from the local mean in the adaptive method.
const ADAPTIVE_C: f64 = 2.0;

impl ThresholdNode {
    pub fn new(value: f64, method: ThresholdMethod) -> Self {
        let mut node = ThresholdNode {
            name: "Threshold".to_string(),
            value: 128.0,
            method: ThresholdMethod::Binary,
            output: ImageBuffer::empty(),
        };
        node.set_parameters(value, method);
        node
    }

    /// Sets the threshold value (clamped to 0–255) and method.
    pub fn set_parameters(&mut self, value: f64, method: ThresholdMethod) {
        self.value = value.clamp(0.0, 255.0);
        self.method = method;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn method(&self) -> ThresholdMethod {
        self.method
    }

    /// 256-bin intensity histogram of a payload, computed over its grayscale
    /// conversion. Empty payloads yield an all-zero histogram.
    pub fn histogram(&self, input: &ImageBuffer) -> [u32; 256] {
        let mut bins = [0u32; 256];
        let gray = input.to_gray();
        for &sample in gray.data() {
            bins[sample as usize] += 1;
        }
        bins
    }
}

impl Default for ThresholdNode {
    fn default() -> Self {
        Self::new(128.0, ThresholdMethod::Binary)
    }
}

fn binary_threshold(gray: &ImageBuffer, value: f64) -> ImageBuffer {
    let mut result = ImageBuffer::new(gray.width(), gray.height(), 1);
    for y in 0..gray.height() {
        for x in 0..gray.width() {
            let on = gray.sample(x, y, 0) as f64 > value;
            result.set_sample(x, y, 0, if on { 255 } else { 0 });
        }
    }
    result
}

fn adaptive_threshold(gray: &ImageBuffer) -> ImageBuffer {
    let mut result = ImageBuffer::new(gray.width(), gray.height(), 1);
    let half = ADAPTIVE_BLOCK / 2;
    for y in 0..gray.height() {
        for x in 0..gray.width() {
            let mut sum = 0.0;
            for dy in -half..=half {
                for dx in -half..=half {
                    sum += gray.sample_clamped(x as i64 + dx, y as i64 + dy, 0) as f64;
                }
            }
            let mean = sum / (ADAPTIVE_BLOCK * ADAPTIVE_BLOCK) as f64;
            let on = gray.sample(x, y, 0) as f64 > mean - ADAPTIVE_C;
            result.set_sample(x, y, 0, if on { 255 } else { 0 });
        }
    }
    result
}

/// Otsu's method: pick the threshold maximizing between-class variance.
fn otsu_level(bins: &[u32; 256]) -> f64 {
    let total: u64 = bins.iter().map(|&count| count as u64).sum();
    if total == 0 {
        return 0.0;
    }

    let weighted_total: f64 = bins
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0usize;
    let mut best_variance = f64::MIN;
    let mut background_count = 0.0;
    let mut background_sum = 0.0;

    for level in 0..256 {
        background_count += bins[level] as f64;
        if background_count == 0.0 {
            continue;
        }
        let foreground_count = total as f64 - background_count;
        if foreground_count == 0.0 {
            break;
        }
        background_sum += level as f64 * bins[level] as f64;

        let mean_background = background_sum / background_count;
        let mean_foreground = (weighted_total - background_sum) / foreground_count;
        let diff = mean_background - mean_foreground;
        let variance = background_count * foreground_count * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_level = level;
        }
    }

    best_level as f64
}

impl ImageNode for ThresholdNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.output = ImageBuffer::empty();
            return;
        };

        let gray = input.to_gray();
        self.output = match self.method {
            ThresholdMethod::Binary => binary_threshold(&gray, self.value),
            ThresholdMethod::Adaptive => adaptive_threshold(&gray),
            ThresholdMethod::Otsu => {
                let level = otsu_level(&self.histogram(input));
                binary_threshold(&gray, level)
            }
        };
    }

    fn output(&self) -> &ImageBuffer {
        &self.output
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
