//! Pipeline node contract and the built-in transform stages.

pub mod blur;
pub mod brightness_contrast;
pub mod edge;
pub mod input;
pub mod output;
pub mod splitter;
pub mod threshold;

pub use blur::BlurNode;
pub use brightness_contrast::BrightnessContrastNode;
pub use edge::{EdgeDetectionNode, EdgeMethod};
pub use input::InputNode;
pub use output::OutputNode;
pub use splitter::ChannelSplitterNode;
pub use threshold::{ThresholdMethod, ThresholdNode};

use crate::diagnostics::{DiagnosticSink, ProcessEvent};
use crate::payload::ImageBuffer;
use std::any::Any;

/// A unit of computation in the pipeline graph.
///
/// The contract has exactly two semantic operations: `process` computes this
/// node's output from the already-computed upstream outputs, and `output`
/// retrieves the last-computed result without triggering any computation.
/// A node never initiates computation of its own inputs; the engine (or a
/// caller invoking `process` directly against computed upstream payloads)
/// is responsible for ordering.
///
/// Failure is local: a node that cannot run reports on the diagnostic sink
/// and stores the empty sentinel as its output, so downstream stages can
/// detect the condition and short-circuit the same way. No error or panic
/// crosses a node boundary.
///
/// Parameter setters and auxiliary accessors (e.g. a splitter's per-channel
/// getters) are inherent methods on the concrete types, reached through
/// `as_any`/`as_any_mut` downcasts.
pub trait ImageNode {
    /// Display name, purely diagnostic.
    fn name(&self) -> &str;

    /// Computes this node's output from the upstream outputs, in declared
    /// input order, and stores it in the node's own output buffer.
    fn process(&mut self, upstream: &[ImageBuffer], diag: &dyn DiagnosticSink);

    /// The most recently stored output (empty sentinel if never computed or
    /// the last computation failed). Pure accessor.
    fn output(&self) -> &ImageBuffer;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Fetches a node's primary (first) input, applying the shared fail-soft
/// contract: a missing or empty upstream payload is reported on the sink and
/// yields `None`, signalling the caller to emit the empty sentinel.
pub(crate) fn primary_input<'a>(
    name: &str,
    upstream: &'a [ImageBuffer],
    diag: &dyn DiagnosticSink,
) -> Option<&'a ImageBuffer> {
    let Some(first) = upstream.first() else {
        diag.report(name, ProcessEvent::MissingInput);
        return None;
    };
    if first.is_empty() {
        diag.report(name, ProcessEvent::EmptyInput { index: 0 });
        return None;
    }
    Some(first)
}
