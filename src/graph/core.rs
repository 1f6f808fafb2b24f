//! Graph construction and execution engine.
//!
//! `NodeGraph` owns every node and wires them together through `NodeId`
//! handles; `GraphEngine` drives one dependency-first evaluation pass over the
//! subgraph reachable from a chosen terminal node.

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::graph::types::{GraphError, NodeId};
use crate::nodes::ImageNode;
use crate::payload::ImageBuffer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

struct GraphEntry {
    node: Box<dyn ImageNode>,
    /// Ordered upstream links. Order is significant: stages read "first input".
    inputs: Vec<NodeId>,
}

/// Arena owning the pipeline nodes and their wiring.
///
/// Nodes are added once during graph assembly and live until the graph is
/// dropped; the engine only ever reads through `NodeId` handles. Edges are
/// held as each node's ordered input list, so cyclic wiring is representable —
/// cycles are not rejected here, they are truncated at run time by the
/// engine's visited set.
pub struct NodeGraph {
    nodes: HashMap<NodeId, GraphEntry>,
    /// Insertion order, for stable listings
    order: Vec<NodeId>,
    /// Next available node ID
    next_node_id: usize,
    /// Diagnostic channel handed to every `process()` call
    sink: Arc<dyn DiagnosticSink>,
}

impl NodeGraph {
    /// Creates an empty graph reporting diagnostics through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Creates an empty graph with a caller-supplied diagnostic sink.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        NodeGraph {
            nodes: HashMap::new(),
            order: Vec::new(),
            next_node_id: 0,
            sink,
        }
    }

    /// Adds a node to the graph, taking ownership of it.
    ///
    /// # Returns
    /// Returns the NodeId handle used for wiring and lookup
    pub fn add_node(&mut self, node: Box<dyn ImageNode>) -> NodeId {
        let node_id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        self.nodes.insert(
            node_id,
            GraphEntry {
                node,
                inputs: Vec::new(),
            },
        );
        self.order.push(node_id);

        node_id
    }

    /// Appends `upstream` to `downstream`'s ordered input list.
    ///
    /// No cycle check is performed; a cyclic edge is accepted and later cut
    /// by the engine's visited set.
    pub fn connect(&mut self, upstream: NodeId, downstream: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&upstream) {
            return Err(GraphError::NodeNotFound(format!(
                "Node {:?} not found",
                upstream
            )));
        }
        let entry = self.nodes.get_mut(&downstream).ok_or_else(|| {
            GraphError::NodeNotFound(format!("Node {:?} not found", downstream))
        })?;
        entry.inputs.push(upstream);
        Ok(())
    }

    /// Checks whether a handle refers to a node in this graph.
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Gets a node by its handle.
    pub fn node(&self, node_id: NodeId) -> Option<&dyn ImageNode> {
        self.nodes.get(&node_id).map(|entry| entry.node.as_ref())
    }

    /// Gets a node as its concrete type, e.g. to read auxiliary accessors.
    pub fn node_as<T: ImageNode + 'static>(&self, node_id: NodeId) -> Option<&T> {
        self.node(node_id).and_then(|node| node.as_any().downcast_ref())
    }

    /// Gets a node as its mutable concrete type, e.g. to change parameters
    /// between runs.
    pub fn node_mut_as<T: ImageNode + 'static>(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(&node_id)
            .and_then(|entry| entry.node.as_any_mut().downcast_mut())
    }

    /// The most recently computed output of a node (empty sentinel if the
    /// node never ran or its last run failed).
    pub fn output(&self, node_id: NodeId) -> Option<&ImageBuffer> {
        self.node(node_id).map(|node| node.output())
    }

    /// The ordered upstream links of a node.
    pub fn inputs(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node_id)
            .map(|entry| entry.inputs.clone())
            .unwrap_or_default()
    }

    /// All node handles, in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    /// Returns the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|entry| entry.inputs.len()).sum()
    }

    /// The diagnostic sink handed to every `process()` call.
    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pass evaluator over the subgraph reachable from a terminal node.
///
/// The engine is a pure scheduler: it guarantees dependency order and
/// at-most-once processing per pass, and has no error channel for per-node
/// failures — those degrade to empty payloads inside the nodes themselves.
#[derive(Debug, Default)]
pub struct GraphEngine;

impl GraphEngine {
    pub fn new() -> Self {
        GraphEngine
    }

    /// Runs one full evaluation pass with a fresh visited set.
    pub fn run(&self, graph: &mut NodeGraph, terminal: NodeId) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        self.execute(graph, terminal, &mut visited)
    }

    /// Evaluates the subgraph reachable from `terminal`, depth-first.
    ///
    /// Each node is marked visited *before* its inputs are recursed into, so
    /// shared sub-graphs run once per pass and cyclic links terminate instead
    /// of recursing unboundedly. After all inputs have run, the terminal
    /// node's `process()` is invoked with its upstream outputs in declared
    /// order.
    ///
    /// The caller supplies the visited set; passing a set that already
    /// contains `terminal` makes the call a no-op.
    ///
    /// # Errors
    /// Returns an error only when a handle does not refer to a node in this
    /// graph. Transform failures inside a node never surface here.
    pub fn execute(
        &self,
        graph: &mut NodeGraph,
        terminal: NodeId,
        visited: &mut HashSet<NodeId>,
    ) -> Result<(), GraphError> {
        if visited.contains(&terminal) {
            return Ok(());
        }
        if !graph.contains(terminal) {
            return Err(GraphError::NodeNotFound(format!(
                "Node {:?} not found",
                terminal
            )));
        }

        // Pre-mark before recursing: this is what cuts cycles and diamonds.
        visited.insert(terminal);

        let inputs = graph.inputs(terminal);
        for &input in &inputs {
            self.execute(graph, input, visited)?;
        }

        // All ancestors are processed; snapshot their outputs and run this node.
        let upstream: Vec<ImageBuffer> = inputs
            .iter()
            .map(|&input| {
                graph
                    .output(input)
                    .cloned()
                    .unwrap_or_else(ImageBuffer::empty)
            })
            .collect();

        let sink = Arc::clone(&graph.sink);
        if let Some(entry) = graph.nodes.get_mut(&terminal) {
            trace!(node = entry.node.name(), inputs = inputs.len(), "processing node");
            entry.node.process(&upstream, sink.as_ref());
        }

        Ok(())
    }
}
