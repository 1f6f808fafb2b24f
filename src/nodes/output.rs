use crate::diagnostics::DiagnosticSink;
use crate::io::{ImageIoError, ImageSink, OutputFormat};
use crate::nodes::{primary_input, ImageNode};
use crate::payload::ImageBuffer;
use std::any::Any;

/// Terminal sink stage.
///
/// `process` only stages the upstream payload in memory; the externally
/// visible write happens on an explicit [`save`](OutputNode::save) call, so
/// repeated evaluation passes do not re-trigger side effects. The controller
/// should check the staged output (or the save result) before relying on it.
pub struct OutputNode {
    name: String,
    filename: String,
    format: OutputFormat,
    staged: ImageBuffer,
}

impl OutputNode {
    pub fn new(filename: impl Into<String>, format: OutputFormat) -> Self {
        OutputNode {
            name: "Output".to_string(),
            filename: filename.into(),
            format,
            staged: ImageBuffer::empty(),
        }
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// Sets the JPEG quality (clamped to 0–100). No effect for other formats.
    pub fn set_quality(&mut self, quality: u8) {
        if let OutputFormat::Jpeg { .. } = self.format {
            self.format = OutputFormat::Jpeg {
                quality: quality.min(100),
            };
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Full target path, filename plus the format's extension.
    pub fn target_path(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }

    /// Commits the staged payload through the sink.
    ///
    /// # Errors
    /// Returns `ImageIoError::EmptyPayload` when nothing valid is staged
    /// (the pass never ran, or an upstream failure degraded the payload),
    /// or the sink's own error when encoding/writing fails.
    pub fn save(&self, sink: &dyn ImageSink) -> Result<(), ImageIoError> {
        if self.staged.is_empty() {
            return Err(ImageIoError::EmptyPayload);
        }
        sink.save(&self.target_path(), self.format, &self.staged)
    }
}

impl ImageNode for OutputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink) {
        let Some(input) = primary_input(&self.name, upstream, diag) else {
            self.staged = ImageBuffer::empty();
            return;
        };
        self.staged = input.clone();
    }

    fn output(&self) -> &ImageBuffer {
        &self.staged
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
    use crate::io::InMemoryImageStore;

    #[test]
    fn test_process_stages_without_saving() {
        let store = InMemoryImageStore::new();
        let mut node = OutputNode::new("result", OutputFormat::Png);
        node.process(&[ImageBuffer::filled(2, 2, 3, 10)], &RecordingSink::new());

        assert!(!node.output().is_empty());
        // Nothing hit the sink yet.
        assert_eq!(store.saved_count(), 0);
    }

    #[test]
    fn test_save_commits_staged_payload() {
        let store = InMemoryImageStore::new();
        let payload = ImageBuffer::filled(2, 2, 3, 10);
        let mut node = OutputNode::new("result", OutputFormat::Jpeg { quality: 90 });
        node.process(&[payload.clone()], &RecordingSink::new());

        node.save(&store).unwrap();
        assert_eq!(store.saved("result.jpg"), Some(payload));
    }

    #[test]
    fn test_save_without_staged_payload_errors() {
        let store = InMemoryImageStore::new();
        let node = OutputNode::new("result", OutputFormat::Png);
        assert_eq!(node.save(&store), Err(ImageIoError::EmptyPayload));
        assert_eq!(store.saved_count(), 0);
    }

    #[test]
    fn test_repeated_process_does_not_touch_sink() {
        let store = InMemoryImageStore::new();
        let mut node = OutputNode::new("result", OutputFormat::Png);
        for _ in 0..3 {
            node.process(&[ImageBuffer::filled(1, 1, 1, 5)], &RecordingSink::new());
        }
        assert_eq!(store.saved_count(), 0);
    }

    #[test]
    fn test_setters_change_target() {
        let mut node = OutputNode::new("a", OutputFormat::Png);
        assert_eq!(node.target_path(), "a.png");

        node.set_filename("b");
        node.set_format(OutputFormat::Jpeg { quality: 95 });
        node.set_quality(200);
        assert_eq!(node.target_path(), "b.jpg");
        assert_eq!(node.format(), OutputFormat::Jpeg { quality: 100 });
    }

    #[test]
    fn test_quality_ignored_for_png() {
        let mut node = OutputNode::new("a", OutputFormat::Png);
        node.set_quality(10);
        assert_eq!(node.format(), OutputFormat::Png);
    }

    #[test]
    fn test_empty_upstream_clears_stage() {
        let mut node = OutputNode::new("result", OutputFormat::Png);
        node.process(&[ImageBuffer::filled(1, 1, 1, 5)], &RecordingSink::new());
        assert!(!node.output().is_empty());

        node.process(&[ImageBuffer::empty()], &RecordingSink::new());
        assert!(node.output().is_empty());
    }
}
