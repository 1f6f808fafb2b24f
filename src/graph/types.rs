use serde::{Deserialize, Serialize};

/// Node identifier
///
/// A stable handle into the graph's node arena. Handles are never reused
/// within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Error types for graph operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node handle not present in the graph
    NodeNotFound(String),
    /// Invalid operation
    InvalidOperation(String),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NodeNotFound(msg) => write!(f, "Node not found: {}", msg),
            GraphError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {}
