use crate::diagnostics::DiagnosticSink;
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Edge detection method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMethod {
    /// Weighted sum of absolute horizontal and vertical gradients
    Sobel,
    /// Gradient magnitude, non-maximum thinning, double threshold
    Canny,
}

/// Edge detection over the (grayscaled) input, with an optional overlay of
/// the detected edges onto the original payload.
pub struct EdgeDetectionNode {
    name: String,
    method: EdgeMethod,
    kernel_size: u32,
    threshold1: f64,
    threshold2: f64,
    overlay: bool,
    output: ImageBuffer,
}

impl EdgeDetectionNode {
    pub fn new(
        method: EdgeMethod,
        kernel_size: u32,
        threshold1: f64,
        threshold2: f64,
        overlay: bool,
    ) -> Self {
        let mut node = EdgeDetectionNode {
            name: "EdgeDetection".to_string(),
            method: EdgeMethod::Canny,
            kernel_size: 3,
            threshold1: 100.0,
            threshold2: 200.0,
            overlay: false,
            output: ImageBuffer::empty(),
        };
        node.set_parameters(method, kernel_size, threshold1, threshold2, overlay);
        node
    }

    /// Sets all parameters at once. The kernel size is forced odd and clamped
    /// to 1–7; thresholds are clamped to 0–255 and reordered low/high.
    pub fn set_parameters(
        &mut self,
        method: EdgeMethod,
        kernel_size: u32,
        threshold1: f64,
        threshold2: f64,
        overlay: bool,
    ) {
        self.method = method;
        // `| 1` rounds an even size up to the next odd one.
        self.kernel_size = kernel_size.clamp(1, 7) | 1;
        let low = threshold1.clamp(0.0, 255.0);
        let high = threshold2.clamp(0.0, 255.0);
        self.threshold1 = low.min(high);
        self.threshold2 = low.max(high);
        self.overlay = overlay;
    }

    pub fn method(&self) -> EdgeMethod {
        self.method
    }

    pub fn kernel_size(&self) -> u32 {
        self.kernel_size
    }

    pub fn thresholds(&self) -> (f64, f64) {
        (self.threshold1, self.threshold2)
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }
}

impl Default for EdgeDetectionNode {
    fn default() -> Self {
        Self::new(EdgeMethod::Canny, 3, 100.0, 200.0, false)
    }
}

/// Binomial smoothing weights of the given odd length (e.g. [1, 2, 1] for 3).
fn binomial(length: u32) -> Vec<f64> {
    let mut row = vec![1.0];
    for _ in 1..length {
        let mut next = vec![1.0; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

/// Separable derivative: central difference along one axis, binomial
/// smoothing of width `kernel_size` along the other. For size 3 this is the
/// classic Sobel operator.
fn gradient(gray: &ImageBuffer, kernel_size: u32, horizontal: bool) -> Vec<f64> {
    let width = gray.width() as i64;
    let height = gray.height() as i64;
    let smooth = binomial(kernel_size);
    let half = (smooth.len() / 2) as i64;
    let mut grid = vec![0.0; (width * height) as usize];

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (i, weight) in smooth.iter().enumerate() {
                let offset = i as i64 - half;
                let (dx, dy) = if horizontal { (0, offset) } else { (offset, 0) };
                let forward = gray.sample_clamped(
                    x + dx + i64::from(horizontal),
                    y + dy + i64::from(!horizontal),
                    0,
                ) as f64;
                let backward = gray.sample_clamped(
                    x + dx - i64::from(horizontal),
                    y + dy - i64::from(!horizontal),
                    0,
                ) as f64;
                acc += weight * (forward - backward);
            }
            grid[(y * width + x) as usize] = acc;
        }
    }
    grid
}

fn sobel_edges(gray: &ImageBuffer, kernel_size: u32) -> ImageBuffer {
    let gx = gradient(gray, kernel_size, true);
    let gy = gradient(gray, kernel_size, false);
    let mut result = ImageBuffer::new(gray.width(), gray.height(), 1);
    for (index, (x_grad, y_grad)) in gx.iter().zip(&gy).enumerate() {
        let value = 0.5 * x_grad.abs() + 0.5 * y_grad.abs();
        let x = (index as u32) % gray.width();
        let y = (index as u32) / gray.width();
        result.set_sample(x, y, 0, value.round().clamp(0.0, 255.0) as u8);
    }
    result
}

fn canny_edges(gray: &ImageBuffer, kernel_size: u32, low: f64, high: f64) -> ImageBuffer {
    let width = gray.width() as i64;
    let height = gray.height() as i64;
    let gx = gradient(gray, kernel_size, true);
    let gy = gradient(gray, kernel_size, false);

    let magnitude: Vec<f64> = gx
        .iter()
        .zip(&gy)
        .map(|(x_grad, y_grad)| x_grad.hypot(*y_grad))
        .collect();

    // Non-maximum suppression along the quantized gradient direction.
    let mut thinned = vec![0.0; magnitude.len()];
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            let mag = magnitude[index];
            if mag == 0.0 {
                continue;
            }
            let angle = gy[index].atan2(gx[index]).to_degrees().rem_euclid(180.0);
            let (dx, dy) = if angle < 22.5 || angle >= 157.5 {
                (1i64, 0i64)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (0, 1)
            } else {
                (-1, 1)
            };
            let neighbor = |nx: i64, ny: i64| -> f64 {
                if nx < 0 || nx >= width || ny < 0 || ny >= height {
                    0.0
                } else {
                    magnitude[(ny * width + nx) as usize]
                }
            };
            if mag >= neighbor(x + dx, y + dy) && mag >= neighbor(x - dx, y - dy) {
                thinned[index] = mag;
            }
        }
    }

    // Double threshold with single-pass weak-edge promotion.
    const STRONG: u8 = 255;
    const WEAK: u8 = 1;
    let mut marks = vec![0u8; thinned.len()];
    for (index, &mag) in thinned.iter().enumerate() {
        if mag >= high {
            marks[index] = STRONG;
        } else if mag >= low {
            marks[index] = WEAK;
        }
    }

    let mut result = ImageBuffer::new(gray.width(), gray.height(), 1);
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            let keep = match marks[index] {
                STRONG => true,
                WEAK => {
                    let mut connected = false;
                    'scan: for dy in -1..=1i64 {
                        for dx in -1..=1i64 {
                            let nx = x + dx;
                            let ny = y + dy;
                            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                                continue;
                            }
                            if marks[(ny * width + nx) as usize] == STRONG {
                                connected = true;
                                break 'scan;
                            }
                        }
                    }
                    connected
                }
                _ => false,
            };
            if keep {
                result.set_sample(x as u32, y as u32, 0, 255);
            }
        }
    }
    result
}

/// Blends single-channel edges over the original payload, 0.8 input to
/// 0.2 edges.
fn overlay_edges(input: &ImageBuffer, edges: &ImageBuffer) -> ImageBuffer {
    let mut result = input.clone();
    for y in 0..input.height() {
        for x in 0..input.width() {
            let edge = edges.sample(x, y, 0) as f64;
            for channel in 0..input.channels() {
                let base = input.sample(x, y, channel) as f64;
                let blended = 0.8 * base + 0.2 * edge;
                result.set_sample(x, y, channel, blended.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    result
}

impl ImageNode for EdgeDetectionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.output = ImageBuffer::empty();
            return;
        };

        let gray = input.to_gray();
        let edges = match self.method {
            EdgeMethod::Sobel => sobel_edges(&gray, self.kernel_size),
            EdgeMethod::Canny => {
                canny_edges(&gray, self.kernel_size, self.threshold1, self.threshold2)
            }
        };

        self.output = if self.overlay {
            overlay_edges(input, &edges)
        } else {
            edges
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
