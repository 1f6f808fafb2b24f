pub mod diagnostics;
pub mod graph;
pub mod io;
pub mod nodes;
pub mod payload;


pub use diagnostics::{DiagnosticSink, ProcessEvent, RecordingSink, TracingSink};
pub use graph::{GraphDescription, GraphEngine, GraphError, NodeGraph, NodeId};
pub use io::{
    FileImageSink, FileImageSource, ImageIoError, ImageSink, ImageSource, InMemoryImageStore,
    OutputFormat,
};
pub use nodes::{
    BlurNode, BrightnessContrastNode, ChannelSplitterNode, EdgeDetectionNode, EdgeMethod,
    ImageNode, InputNode, OutputNode, ThresholdMethod, ThresholdNode,
};
pub use payload::{ImageBuffer, PayloadError};
