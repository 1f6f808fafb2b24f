use crate::diagnostics::{DiagnosticSink, ProcessEvent};
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Splits the input into single-channel planes.
///
/// The node's output is multi-valued: individual planes are read through
/// `channel(i)`. The single-value `output()` falls back to a deterministic
/// default — the first plane in grayscale mode, or a re-merge of exactly
/// three planes otherwise (empty sentinel when the merge is not possible).
pub struct ChannelSplitterNode {
    name: String,
    grayscale: bool,
    channels: Vec<ImageBuffer>,
    /// Default single-value output derived from `channels` after each run
    output: ImageBuffer,
}

impl ChannelSplitterNode {
    pub fn new(grayscale: bool) -> Self {
        ChannelSplitterNode {
            name: "ColorChannelSplitter".to_string(),
            grayscale,
            channels: Vec::new(),
            output: ImageBuffer::empty(),
        }
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.grayscale = grayscale;
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    /// Number of planes produced by the last run.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The plane at `index`, or the empty sentinel when out of range or the
    /// node has not run.
    pub fn channel(&self, index: usize) -> ImageBuffer {
        self.channels.get(index).cloned().unwrap_or_default()
    }

    fn rebuild_default_output(&mut self) {
        self.output = if self.grayscale {
            self.channel(0)
        } else if self.channels.len() == 3 {
            merge(&self.channels)
        } else {
            ImageBuffer::empty()
        };
    }
}

impl Default for ChannelSplitterNode {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Min-max normalizes a single-channel plane to the full 0–255 range.
/// A constant plane is left unchanged.
fn normalize(plane: &mut ImageBuffer) {
    let (min, max) = plane
        .data()
        .iter()
        .fold((u8::MAX, u8::MIN), |(min, max), &sample| {
            (min.min(sample), max.max(sample))
        });
    if max <= min {
        return;
    }
    let span = (max - min) as f64;
    for sample in plane.data_mut() {
        *sample = (((*sample - min) as f64 / span) * 255.0).round() as u8;
    }
}

/// Interleaves three equally-sized planes back into one payload.
fn merge(planes: &[ImageBuffer]) -> ImageBuffer {
    let first = &planes[0];
    let mut merged = ImageBuffer::new(first.width(), first.height(), planes.len() as u8);
    for (index, plane) in planes.iter().enumerate() {
        for y in 0..first.height() {
            for x in 0..first.width() {
                merged.set_sample(x, y, index as u8, plane.sample(x, y, 0));
            }
        }
    }
    merged
}

impl ImageNode for ChannelSplitterNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        self.channels.clear();
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.output = ImageBuffer::empty();
            return;
        };

        for channel in 0..input.channels() {
            let mut plane = ImageBuffer::new(input.width(), input.height(), 1);
            for y in 0..input.height() {
                for x in 0..input.width() {
                    plane.set_sample(x, y, 0, input.sample(x, y, channel));
                }
            }
            if self.grayscale {
                normalize(&mut plane);
            }
            self.channels.push(plane);
        }

        if !self.grayscale && self.channels.len() != 3 {
            diag.report(
                &self.name,
                ProcessEvent::UnsupportedInput {
                    detail: format!(
                        "merge needs 3 channels, input has {}",
                        self.channels.len()
                    ),
                },
            );
        }
        self.rebuild_default_output();
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

    fn rgb_gradient() -> ImageBuffer {
        let mut image = ImageBuffer::new(2, 1, 3);
        image.set_sample(0, 0, 0, 10);
        image.set_sample(1, 0, 0, 20);
        image.set_sample(0, 0, 1, 0);
        image.set_sample(1, 0, 1, 255);
        image.set_sample(0, 0, 2, 100);
        image.set_sample(1, 0, 2, 100);
        image
    }

    #[test]
    fn test_split_produces_one_plane_per_channel() {
        let mut node = ChannelSplitterNode::new(false);
        node.process(&[rgb_gradient()], &RecordingSink::new());

        assert_eq!(node.channel_count(), 3);
        assert_eq!(node.channel(1).sample(1, 0, 0), 255);
        assert_eq!(node.channel(2).channels(), 1);
    }

    #[test]
    fn test_channel_out_of_range_is_sentinel() {
        let mut node = ChannelSplitterNode::new(false);
        node.process(&[rgb_gradient()], &RecordingSink::new());
        assert!(node.channel(7).is_empty());
    }

    #[test]
    fn test_grayscale_normalizes_planes() {
        let mut node = ChannelSplitterNode::new(true);
        node.process(&[rgb_gradient()], &RecordingSink::new());

        // Red plane 10..20 stretches to 0..255.
        let red = node.channel(0);
        assert_eq!(red.sample(0, 0, 0), 0);
        assert_eq!(red.sample(1, 0, 0), 255);
        // Constant plane stays put.
        assert_eq!(node.channel(2).sample(0, 0, 0), 100);
    }

    #[test]
    fn test_grayscale_default_output_is_first_plane() {
        let mut node = ChannelSplitterNode::new(true);
        node.process(&[rgb_gradient()], &RecordingSink::new());
        assert_eq!(*node.output(), node.channel(0));
    }

    #[test]
    fn test_color_default_output_is_remerge() {
        let mut node = ChannelSplitterNode::new(false);
        let input = rgb_gradient();
        node.process(&[input.clone()], &RecordingSink::new());
        assert_eq!(*node.output(), input);
    }

    #[test]
    fn test_color_merge_requires_three_planes() {
        let sink = RecordingSink::new();
        let mut node = ChannelSplitterNode::new(false);
        node.process(&[ImageBuffer::filled(2, 2, 1, 9)], &sink);

        assert!(node.output().is_empty());
        assert_eq!(node.channel_count(), 1);
        assert!(matches!(
            sink.events_for("ColorChannelSplitter").as_slice(),
            [ProcessEvent::UnsupportedInput { .. }]
        ));
    }

    #[test]
    fn test_missing_input_clears_previous_channels() {
        let mut node = ChannelSplitterNode::new(true);
        node.process(&[rgb_gradient()], &RecordingSink::new());
        assert_eq!(node.channel_count(), 3);

        node.process(&[], &RecordingSink::new());
        assert_eq!(node.channel_count(), 0);
        assert!(node.output().is_empty());
    }
}
