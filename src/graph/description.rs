//! Serializable graph summary for display and debugging surfaces.
//!
//! One-way export only: graph structure is rebuilt by traversal on every run
//! and is never persisted or reloaded from this form.

use crate::graph::core::NodeGraph;
use serde::{Deserialize, Serialize};

/// A node as it appears in a graph description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Node handle value
    pub id: usize,
    /// Display name of the node
    pub name: String,
    /// Whether the node currently holds a computed (non-empty) output
    pub has_output: bool,
}

/// A dependency edge: `target` reads the output of `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub source: usize,
    pub target: usize,
}

/// Complete description of a graph's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<EdgeSummary>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl NodeGraph {
    /// Describes the graph's nodes and wiring in a serializable form.
    pub fn describe(&self) -> GraphDescription {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for node_id in self.node_ids() {
            if let Some(node) = self.node(node_id) {
                nodes.push(NodeSummary {
                    id: node_id.0,
                    name: node.name().to_string(),
                    has_output: !node.output().is_empty(),
                });
            }
            for input in self.inputs(node_id) {
                edges.push(EdgeSummary {
                    source: input.0,
                    target: node_id.0,
                });
            }
        }

        let node_count = nodes.len();
        let edge_count = edges.len();
        GraphDescription {
            nodes,
            edges,
            node_count,
            edge_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{BrightnessContrastNode, InputNode};
    use crate::payload::ImageBuffer;

    #[test]
    fn test_describe_lists_nodes_and_edges() {
        let mut graph = NodeGraph::new();
        let input = graph.add_node(Box::new(InputNode::with_image(ImageBuffer::filled(
            1, 1, 1, 7,
        ))));
        let adjust = graph.add_node(Box::new(BrightnessContrastNode::default()));
        graph.connect(input, adjust).unwrap();

        let description = graph.describe();
        assert_eq!(description.node_count, 2);
        assert_eq!(description.edge_count, 1);
        assert_eq!(description.nodes[0].name, "ImageInput");
        assert_eq!(
            description.edges,
            vec![EdgeSummary {
                source: input.0,
                target: adjust.0
            }]
        );
        // Nothing has run yet.
        assert!(!description.nodes[1].has_output);
    }

    #[test]
    fn test_describe_serializes_to_json() {
        let mut graph = NodeGraph::new();
        graph.add_node(Box::new(InputNode::new("Input")));

        let json = serde_json::to_string(&graph.describe()).unwrap();
        assert!(json.contains("\"node_count\":1"));
    }
}
