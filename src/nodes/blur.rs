use crate::diagnostics::DiagnosticSink;
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Gaussian blur with a kernel of size `2 * radius + 1`.
///
/// Uniform mode runs the separable kernel horizontally then vertically;
/// directional mode runs the horizontal pass only.
pub struct BlurNode {
    name: String,
    radius: u32,
    directional: bool,
    output: ImageBuffer,
}

impl BlurNode {
    pub fn new(radius: u32, directional: bool) -> Self {
        let mut node = BlurNode {
            name: "Blur".to_string(),
            radius: 5,
            directional: false,
            output: ImageBuffer::empty(),
        };
        node.set_parameters(radius, directional);
        node
    }

    /// Sets the blur radius (clamped to 1–20) and directionality.
    pub fn set_parameters(&mut self, radius: u32, directional: bool) {
        self.radius = radius.clamp(1, 20);
        self.directional = directional;
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn directional(&self) -> bool {
        self.directional
    }

    /// The normalized 1-D gaussian kernel currently in effect.
    pub fn kernel(&self) -> Vec<f64> {
        gaussian_kernel(self.radius)
    }
}

impl Default for BlurNode {
    fn default() -> Self {
        Self::new(5, false)
    }
}

/// Normalized 1-D gaussian kernel of size `2 * radius + 1`, sigma derived
/// from the kernel size.
fn gaussian_kernel(radius: u32) -> Vec<f64> {
    let ksize = 2 * radius as i64 + 1;
    let sigma = 0.3 * ((ksize - 1) as f64 * 0.5 - 1.0) + 0.8;
    let mut kernel = Vec::with_capacity(ksize as usize);
    let mut sum = 0.0;
    for i in 0..ksize {
        let x = (i - radius as i64) as f64;
        let value = (-(x * x) / (2.0 * sigma * sigma)).exp();
        kernel.push(value);
        sum += value;
    }
    for value in &mut kernel {
        *value /= sum;
    }
    kernel
}

/// One separable convolution pass. `horizontal` selects the axis.
fn convolve_pass(input: &ImageBuffer, kernel: &[f64], horizontal: bool) -> ImageBuffer {
    let radius = (kernel.len() / 2) as i64;
    let mut result = ImageBuffer::new(input.width(), input.height(), input.channels());
    for y in 0..input.height() {
        for x in 0..input.width() {
            for channel in 0..input.channels() {
                let mut acc = 0.0;
                for (i, weight) in kernel.iter().enumerate() {
                    let offset = i as i64 - radius;
                    let sample = if horizontal {
                        input.sample_clamped(x as i64 + offset, y as i64, channel)
                    } else {
                        input.sample_clamped(x as i64, y as i64 + offset, channel)
                    };
                    acc += sample as f64 * weight;
                }
                result.set_sample(x, y, channel, acc.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    result
}

impl ImageNode for BlurNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.output = ImageBuffer::empty();
            return;
        };

        let kernel = gaussian_kernel(self.radius);
        let horizontal = convolve_pass(input, &kernel, true);
        self.output = if self.directional {
            horizontal
        } else {
            convolve_pass(&horizontal, &kernel, false)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    #[test]
    fn test_kernel_is_normalized() {
        let node = BlurNode::new(3, false);
        let kernel = node.kernel();
        assert_eq!(kernel.len(), 7);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Symmetric around the center
        assert!((kernel[0] - kernel[6]).abs() < 1e-12);
        assert!(kernel[3] > kernel[2]);
    }

    #[test]
    fn test_radius_is_clamped() {
        let node = BlurNode::new(0, false);
        assert_eq!(node.radius(), 1);
        let node = BlurNode::new(99, true);
        assert_eq!(node.radius(), 20);
        assert!(node.directional());
    }

    #[test]
    fn test_uniform_blur_preserves_flat_regions() {
        let mut node = BlurNode::new(2, false);
        let upstream = vec![ImageBuffer::filled(8, 8, 1, 77)];
        node.process(&upstream, &RecordingSink::new());
        // A constant image is a fixed point of gaussian blur.
        assert_eq!(node.output().sample(4, 4, 0), 77);
        assert_eq!(node.output().sample(0, 0, 0), 77);
    }

    #[test]
    fn test_blur_spreads_an_impulse() {
        let mut image = ImageBuffer::new(7, 7, 1);
        image.set_sample(3, 3, 0, 255);
        let mut node = BlurNode::new(1, false);
        node.process(&[image], &RecordingSink::new());

        let output = node.output();
        let center = output.sample(3, 3, 0);
        let neighbor = output.sample(3, 2, 0);
        assert!(center < 255);
        assert!(neighbor > 0);
        assert!(center > neighbor);
    }

    #[test]
    fn test_directional_blur_only_spreads_horizontally() {
        let mut image = ImageBuffer::new(7, 7, 1);
        image.set_sample(3, 3, 0, 255);
        let mut node = BlurNode::new(2, true);
        node.process(&[image], &RecordingSink::new());

        let output = node.output();
        assert!(output.sample(2, 3, 0) > 0);
        // The vertical neighbor is untouched by a horizontal-only pass.
        assert_eq!(output.sample(3, 2, 0), 0);
    }

    #[test]
    fn test_missing_input_fails_soft() {
        let mut node = BlurNode::default();
        node.process(&[], &RecordingSink::new());
        assert!(node.output().is_empty());
    }
}
