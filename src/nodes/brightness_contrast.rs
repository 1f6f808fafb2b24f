use crate::diagnostics::DiagnosticSink;
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Linear brightness/contrast adjustment: `sample * contrast + brightness`,
/// saturating to the 0–255 range per sample.
pub struct BrightnessContrastNode {
    name: String,
    /// Contrast multiplier (1.0 = no change)
    contrast: f64,
    /// Brightness offset (0 = no change)
    brightness: i32,
    output: ImageBuffer,
}

impl BrightnessContrastNode {
    pub fn new(contrast: f64, brightness: i32) -> Self {
        let mut node = BrightnessContrastNode {
            name: "BrightnessContrast".to_string(),
            contrast: 1.0,
            brightness: 0,
            output: ImageBuffer::empty(),
        };
        node.set_parameters(contrast, brightness);
        node
    }

    /// Sets contrast and brightness, clamping both into their valid ranges
    /// (contrast 0.0–3.0, brightness −100–100).
    pub fn set_parameters(&mut self, contrast: f64, brightness: i32) {
        self.contrast = contrast.clamp(0.0, 3.0);
        self.brightness = brightness.clamp(-100, 100);
    }

    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }
}

impl Default for BrightnessContrastNode {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

impl ImageNode for BrightnessContrastNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.output = ImageBuffer::empty();
            return;
        };

        let mut result = input.clone();
        for sample in result.data_mut() {
            let adjusted = *sample as f64 * self.contrast + self.brightness as f64;
            *sample = adjusted.round().clamp(0.0, 255.0) as u8;
        }
        self.output = result;
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
    use crate::diagnostics::{ProcessEvent, RecordingSink};

    #[test]
    fn test_brightness_offset() {
        let mut node = BrightnessContrastNode::new(1.0, 10);
        let upstream = vec![ImageBuffer::filled(2, 2, 1, 100)];
        node.process(&upstream, &RecordingSink::new());
        assert_eq!(node.output().sample(0, 0, 0), 110);
    }

    #[test]
    fn test_contrast_scaling_saturates() {
        let mut node = BrightnessContrastNode::new(3.0, 0);
        let upstream = vec![ImageBuffer::filled(1, 1, 1, 200)];
        node.process(&upstream, &RecordingSink::new());
        // 200 * 3.0 saturates at 255
        assert_eq!(node.output().sample(0, 0, 0), 255);
    }

    #[test]
    fn test_negative_brightness_saturates_at_zero() {
        let mut node = BrightnessContrastNode::new(1.0, -100);
        let upstream = vec![ImageBuffer::filled(1, 1, 1, 40)];
        node.process(&upstream, &RecordingSink::new());
        assert_eq!(node.output().sample(0, 0, 0), 0);
    }

    #[test]
    fn test_parameters_are_clamped() {
        let mut node = BrightnessContrastNode::new(9.0, 500);
        assert_eq!(node.contrast(), 3.0);
        assert_eq!(node.brightness(), 100);

        node.set_parameters(-1.0, -500);
        assert_eq!(node.contrast(), 0.0);
        assert_eq!(node.brightness(), -100);
    }

    #[test]
    fn test_missing_input_fails_soft() {
        let sink = RecordingSink::new();
        let mut node = BrightnessContrastNode::default();
        node.process(&[], &sink);
        assert!(node.output().is_empty());
        assert_eq!(
            sink.events_for("BrightnessContrast"),
            vec![ProcessEvent::MissingInput]
        );
    }

    #[test]
    fn test_empty_input_fails_soft() {
        let sink = RecordingSink::new();
        let mut node = BrightnessContrastNode::default();
        node.process(&[ImageBuffer::empty()], &sink);
        assert!(node.output().is_empty());
        assert_eq!(
            sink.events_for("BrightnessContrast"),
            vec![ProcessEvent::EmptyInput { index: 0 }]
        );
    }
}
