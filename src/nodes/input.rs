use crate::diagnostics::DiagnosticSink;
use crate::io::{ImageIoError, ImageSource};
use crate::nodes::ImageNode;
use crate::payload::ImageBuffer;
use std::any::Any;

/// Source stage holding the backing payload a pipeline starts from.
///
/// `process` is a no-op: the payload is set directly (`set_image`) or loaded
/// through an [`ImageSource`]. An empty backing payload flows downstream as
/// the empty sentinel, which dependent stages fail-soft on.
pub struct InputNode {
    name: String,
    image: ImageBuffer,
}

impl InputNode {
    /// Creates an input node with no payload yet.
    pub fn new(name: impl Into<String>) -> Self {
        InputNode {
            name: name.into(),
            image: ImageBuffer::empty(),
        }
    }

    /// Creates an input node pre-filled with a payload.
    pub fn with_image(image: ImageBuffer) -> Self {
        InputNode {
            name: "ImageInput".to_string(),
            image,
        }
    }

    /// Replaces the backing payload.
    pub fn set_image(&mut self, image: ImageBuffer) {
        self.image = image;
    }

    /// Clears the backing payload back to the empty sentinel.
    pub fn clear(&mut self) {
        self.image = ImageBuffer::empty();
    }

    /// Reloads the backing payload from a source.
    ///
    /// On failure the payload is reset to the empty sentinel so downstream
    /// stages observe the usual short-circuit condition.
    pub fn load_from(&mut self, source: &dyn ImageSource, path: &str) -> Result<(), ImageIoError> {
        match source.load(path) {
            Ok(image) => {
                self.image = image;
                Ok(())
            }
            Err(err) => {
                self.image = ImageBuffer::empty();
                Err(err)
            }
        }
    }

    /// Whether a payload is currently loaded.
    pub fn is_loaded(&self) -> bool {
        !self.image.is_empty()
    }
}

impl ImageNode for InputNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, _upstream: &[ImageBuffer], _diag: &dyn DiagnosticSink) {
        // Source stage: the payload is already in place.
    }

    fn output(&self) -> &ImageBuffer {
        &self.image
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
    use crate::diagnostics::TracingSink;
    use crate::io::InMemoryImageStore;

    #[test]
    fn test_new_node_outputs_sentinel() {
        let node = InputNode::new("Input");
        assert!(node.output().is_empty());
        assert!(!node.is_loaded());
    }

    #[test]
    fn test_set_image_and_clear() {
        let mut node = InputNode::new("Input");
        node.set_image(ImageBuffer::filled(2, 2, 3, 50));
        assert!(node.is_loaded());

        node.clear();
        assert!(node.output().is_empty());
    }

    #[test]
    fn test_process_is_noop() {
        let mut node = InputNode::with_image(ImageBuffer::filled(1, 1, 1, 5));
        node.process(&[], &TracingSink);
        assert_eq!(node.output().sample(0, 0, 0), 5);
    }

    #[test]
    fn test_load_from_source() {
        let mut store = InMemoryImageStore::new();
        store.insert("cat.png", ImageBuffer::filled(4, 4, 3, 128));

        let mut node = InputNode::new("Input");
        node.load_from(&store, "cat.png").unwrap();
        assert!(node.is_loaded());
    }

    #[test]
    fn test_failed_load_resets_to_sentinel() {
        let store = InMemoryImageStore::new();
        let mut node = InputNode::with_image(ImageBuffer::filled(1, 1, 1, 1));

        let result = node.load_from(&store, "missing.png");
        assert!(result.is_err());
        assert!(node.output().is_empty());
    }
}
