//! Node graph construction and the execution engine.

pub mod core;
pub mod description;
pub mod types;

pub use self::core::{GraphEngine, NodeGraph};
pub use description::{EdgeSummary, GraphDescription, NodeSummary};
pub use types::{GraphError, NodeId};
