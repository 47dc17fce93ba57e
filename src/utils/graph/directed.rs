//! Core directed graph implementation.
//!
//! This module provides [`DirectedGraph`], the primary graph data structure used
//! by the control-flow analysis. The implementation uses adjacency lists for
//! efficient traversal while maintaining full edge data access.
//!
//! Nodes and edges live in arenas indexed by [`NodeId`] / [`EdgeId`]. Removal
//! leaves a tombstone instead of shifting storage, so identifiers stay stable
//! for every surviving element — a requirement for the vertex-merging passes,
//! which hold node ids in address tables and program-order links while the
//! graph shrinks underneath them.

use std::ops::{Index, IndexMut};

use crate::{
    utils::graph::{edge::EdgeId, node::NodeId},
    Error, Result,
};

/// Internal storage for edge data and endpoints.
#[derive(Debug, Clone)]
struct EdgeData<E> {
    /// Source node of the edge
    source: NodeId,
    /// Target node of the edge
    target: NodeId,
    /// User-provided edge data
    data: E,
}

/// A directed graph with typed node and edge data.
///
/// `DirectedGraph` provides a flexible, efficient graph implementation suitable
/// for program analysis tasks. It supports:
///
/// - Generic node data (`N`) - Store any data associated with each node
/// - Generic edge data (`E`) - Store any data associated with each edge
/// - Efficient adjacency queries via adjacency lists
/// - Both forward (successors) and backward (predecessors) traversal
/// - In-place mutation: removing nodes/edges and redirecting edge sources
///
/// # Memory Layout
///
/// - Nodes are stored in an arena of `Option<N>` slots indexed by `NodeId`
/// - Edges are stored in an arena of optional records indexed by `EdgeId`
/// - Adjacency lists (outgoing/incoming) store `EdgeId` references and are
///   kept in sync on every removal or redirection
///
/// Identifiers of removed elements are never reused.
///
/// # Thread Safety
///
/// `DirectedGraph<N, E>` is [`Send`] and [`Sync`] when both `N` and `E` are,
/// enabling safe concurrent read access after construction. The graph does not
/// support concurrent modification; build and mutate the graph single-threaded,
/// then use it immutably from multiple threads.
///
/// # Examples
///
/// ```rust,ignore
/// use stackflow::utils::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<&str, i32> = DirectedGraph::new();
///
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// let c = graph.add_node("C");
///
/// graph.add_edge(a, b, 10)?;
/// graph.add_edge(b, c, 20)?;
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    /// Node data storage; `None` marks a removed node (tombstone)
    nodes: Vec<Option<N>>,
    /// Edge data storage; `None` marks a removed edge (tombstone)
    edges: Vec<Option<EdgeData<E>>>,
    /// Outgoing edges per node (adjacency list for successors)
    outgoing: Vec<Vec<EdgeId>>,
    /// Incoming edges per node (adjacency list for predecessors)
    incoming: Vec<Vec<EdgeId>>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates a new empty directed graph.
    ///
    /// The graph starts with no nodes or edges. Use [`add_node`](Self::add_node)
    /// and [`add_edge`](Self::add_edge) to build up the graph structure.
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Creates a new directed graph with pre-allocated capacity.
    ///
    /// Pre-allocating capacity can improve performance when the approximate
    /// size of the graph is known in advance, by avoiding reallocations
    /// during construction.
    ///
    /// # Arguments
    ///
    /// * `node_capacity` - Expected number of nodes
    /// * `edge_capacity` - Expected number of edges
    #[must_use]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            outgoing: Vec::with_capacity(node_capacity),
            incoming: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a new node with the given data to the graph.
    ///
    /// The node is assigned the next sequential `NodeId`, starting from 0.
    /// The returned `NodeId` can be used to reference this node when adding
    /// edges or querying the graph.
    ///
    /// # Arguments
    ///
    /// * `data` - The data to associate with this node
    ///
    /// # Returns
    ///
    /// The `NodeId` assigned to the new node.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(data));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Returns a reference to the data associated with the given node.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to look up
    ///
    /// # Returns
    ///
    /// `Some(&N)` if the node exists and has not been removed, `None` otherwise.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index()).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to the data associated with the given node.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to look up
    ///
    /// # Returns
    ///
    /// `Some(&mut N)` if the node exists and has not been removed, `None` otherwise.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index()).and_then(Option::as_mut)
    }

    /// Returns the number of live (non-removed) nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns an iterator over all live node identifiers in the graph.
    ///
    /// Nodes are yielded in the order they were added (ascending `NodeId`);
    /// removed nodes are skipped.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| NodeId::new(i)))
    }

    /// Returns an iterator over all live nodes with their identifiers.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|data| (NodeId::new(i), data)))
    }

    /// Checks if the given node ID refers to a live node in this graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Returns `true` if the graph contains no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Adds a directed edge from `source` to `target` with the given data.
    ///
    /// The edge is assigned the next sequential `EdgeId`, starting from 0.
    /// Multiple edges between the same pair of nodes are allowed (multigraph).
    ///
    /// # Arguments
    ///
    /// * `source` - The source node of the edge
    /// * `target` - The target node of the edge
    /// * `data` - The data to associate with this edge
    ///
    /// # Returns
    ///
    /// The `EdgeId` assigned to the new edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either `source` or `target` does not
    /// refer to a live node in the graph.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        if !self.contains_node(source) {
            return Err(Error::GraphError(format!(
                "source node {source} does not exist in graph with {} nodes",
                self.nodes.len()
            )));
        }
        if !self.contains_node(target) {
            return Err(Error::GraphError(format!(
                "target node {target} does not exist in graph with {} nodes",
                self.nodes.len()
            )));
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Some(EdgeData {
            source,
            target,
            data,
        }));

        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);

        Ok(id)
    }

    /// Returns a reference to the data associated with the given edge.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges
            .get(edge.index())
            .and_then(Option::as_ref)
            .map(|e| &e.data)
    }

    /// Returns the source and target nodes of the given edge.
    ///
    /// # Returns
    ///
    /// `Some((source, target))` if the edge exists, `None` otherwise.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges
            .get(edge.index())
            .and_then(Option::as_ref)
            .map(|e| (e.source, e.target))
    }

    /// Returns the number of live (non-removed) edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    /// Returns an iterator over the successors of the given node.
    ///
    /// Successors are nodes that are targets of edges originating from this node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing[node.index()]
            .iter()
            .filter_map(|&edge| self.edges[edge.index()].as_ref().map(|e| e.target))
    }

    /// Returns an iterator over the predecessors of the given node.
    ///
    /// Predecessors are nodes that are sources of edges targeting this node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming[node.index()]
            .iter()
            .filter_map(|&edge| self.edges[edge.index()].as_ref().map(|e| e.source))
    }

    /// Returns an iterator over outgoing edges from the given node.
    ///
    /// # Returns
    ///
    /// An iterator yielding `(EdgeId, target NodeId, &E)` tuples for each
    /// outgoing edge.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.outgoing[node.index()].iter().filter_map(|&edge| {
            self.edges[edge.index()]
                .as_ref()
                .map(|e| (edge, e.target, &e.data))
        })
    }

    /// Returns an iterator over incoming edges to the given node.
    ///
    /// # Returns
    ///
    /// An iterator yielding `(EdgeId, source NodeId, &E)` tuples for each
    /// incoming edge.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.incoming[node.index()].iter().filter_map(|&edge| {
            self.edges[edge.index()]
                .as_ref()
                .map(|e| (edge, e.source, &e.data))
        })
    }

    /// Returns the out-degree (number of outgoing edges) of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing[node.index()].len()
    }

    /// Returns the in-degree (number of incoming edges) of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node index for this graph.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming[node.index()].len()
    }

    /// Removes an edge from the graph, detaching it from both endpoints.
    ///
    /// The edge's id becomes a tombstone and is never reused.
    ///
    /// # Arguments
    ///
    /// * `edge` - The edge to remove
    ///
    /// # Returns
    ///
    /// The edge data if the edge was live, `None` otherwise.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Option<E> {
        let slot = self.edges.get_mut(edge.index())?.take()?;
        self.outgoing[slot.source.index()].retain(|&e| e != edge);
        self.incoming[slot.target.index()].retain(|&e| e != edge);
        Some(slot.data)
    }

    /// Removes a node and every edge incident to it.
    ///
    /// The node's id becomes a tombstone: it is skipped by iteration and never
    /// reused, so ids held elsewhere stay valid for the surviving nodes.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to remove
    ///
    /// # Returns
    ///
    /// The node data if the node was live, `None` otherwise.
    pub fn remove_node(&mut self, node: NodeId) -> Option<N> {
        if !self.contains_node(node) {
            return None;
        }
        let incident: Vec<EdgeId> = self.outgoing[node.index()]
            .iter()
            .chain(self.incoming[node.index()].iter())
            .copied()
            .collect();
        for edge in incident {
            self.remove_edge(edge);
        }
        self.nodes.get_mut(node.index())?.take()
    }

    /// Re-sources every outgoing edge of `from` so it originates from `to`.
    ///
    /// Edge data and targets are preserved; only the source endpoint changes.
    /// Used by vertex merging, where the absorbed node's outgoing edges become
    /// the surviving node's.
    ///
    /// # Arguments
    ///
    /// * `from` - The node whose outgoing edges are moved
    /// * `to` - The node that becomes the new source of those edges
    pub fn redirect_outgoing(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            return;
        }
        let moved = std::mem::take(&mut self.outgoing[from.index()]);
        for &edge in &moved {
            if let Some(data) = self.edges.get_mut(edge.index()).and_then(Option::as_mut) {
                data.source = to;
            }
        }
        self.outgoing[to.index()].extend(moved);
    }
}

impl<N, E> Index<NodeId> for DirectedGraph<N, E> {
    type Output = N;

    fn index(&self, node: NodeId) -> &N {
        match self.nodes.get(node.index()).and_then(Option::as_ref) {
            Some(data) => data,
            None => panic!("node {node} does not exist or has been removed"),
        }
    }
}

impl<N, E> IndexMut<NodeId> for DirectedGraph<N, E> {
    fn index_mut(&mut self, node: NodeId) -> &mut N {
        match self.nodes.get_mut(node.index()).and_then(Option::as_mut) {
            Some(data) => data,
            None => panic!("node {node} does not exist or has been removed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a diamond graph: A -> B, A -> C, B -> D, C -> D
    fn create_diamond_graph() -> DirectedGraph<&'static str, ()> {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(a, c, ()).unwrap();
        graph.add_edge(b, d, ()).unwrap();
        graph.add_edge(c, d, ()).unwrap();
        graph
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph: DirectedGraph<(), ()> = DirectedGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_node_and_access() {
        let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();

        let a = graph.add_node("A");
        assert_eq!(a, NodeId::new(0));
        assert_eq!(graph.node(a), Some(&"A"));
        assert_eq!(graph.node(NodeId::new(999)), None);
        assert_eq!(graph[a], "A");
    }

    #[test]
    fn test_add_edge_and_degrees() {
        let graph = create_diamond_graph();

        assert_eq!(graph.out_degree(NodeId::new(0)), 2);
        assert_eq!(graph.in_degree(NodeId::new(3)), 2);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_add_edge_invalid_endpoint() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());

        assert!(graph.add_edge(NodeId::new(999), a, ()).is_err());
        assert!(graph.add_edge(a, NodeId::new(999), ()).is_err());
    }

    #[test]
    fn test_successors_and_predecessors() {
        let graph = create_diamond_graph();

        let succ: Vec<NodeId> = graph.successors(NodeId::new(0)).collect();
        assert_eq!(succ, vec![NodeId::new(1), NodeId::new(2)]);

        let pred: Vec<NodeId> = graph.predecessors(NodeId::new(3)).collect();
        assert_eq!(pred, vec![NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = create_diamond_graph();
        let (a, b) = (NodeId::new(0), NodeId::new(1));

        let edge = graph
            .outgoing_edges(a)
            .find(|&(_, target, _)| target == b)
            .map(|(id, _, _)| id)
            .unwrap();
        assert!(graph.remove_edge(edge).is_some());

        assert_eq!(graph.out_degree(a), 1);
        assert_eq!(graph.in_degree(b), 0);
        assert_eq!(graph.edge_count(), 3);

        // Removing again is a no-op
        assert!(graph.remove_edge(edge).is_none());
    }

    #[test]
    fn test_remove_node_detaches_edges() {
        let mut graph = create_diamond_graph();
        let b = NodeId::new(1);

        assert_eq!(graph.remove_node(b), Some("B"));
        assert!(!graph.contains_node(b));
        assert_eq!(graph.node_count(), 3);

        // A keeps only the edge to C, D keeps only the edge from C
        assert_eq!(graph.out_degree(NodeId::new(0)), 1);
        assert_eq!(graph.in_degree(NodeId::new(3)), 1);

        // Node ids of survivors are unchanged
        let ids: Vec<NodeId> = graph.node_ids().collect();
        assert_eq!(ids, vec![NodeId::new(0), NodeId::new(2), NodeId::new(3)]);
    }

    #[test]
    fn test_remove_node_with_self_loop() {
        let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
        let a = graph.add_node("A");
        graph.add_edge(a, a, ()).unwrap();

        assert_eq!(graph.remove_node(a), Some("A"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_redirect_outgoing() {
        let mut graph: DirectedGraph<&str, i32> = DirectedGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");

        graph.add_edge(b, c, 10).unwrap();
        graph.add_edge(b, d, 20).unwrap();

        graph.redirect_outgoing(b, a);

        assert_eq!(graph.out_degree(b), 0);
        assert_eq!(graph.out_degree(a), 2);

        let mut targets: Vec<(NodeId, i32)> = graph
            .outgoing_edges(a)
            .map(|(_, target, &data)| (target, data))
            .collect();
        targets.sort();
        assert_eq!(targets, vec![(c, 10), (d, 20)]);

        // Incoming side sees the new source
        let pred: Vec<NodeId> = graph.predecessors(c).collect();
        assert_eq!(pred, vec![a]);
    }

    #[test]
    fn test_node_ids_skip_tombstones() {
        let mut graph: DirectedGraph<i32, ()> = DirectedGraph::new();
        for i in 0..5 {
            graph.add_node(i);
        }
        graph.remove_node(NodeId::new(2));

        let ids: Vec<usize> = graph.node_ids().map(NodeId::index).collect();
        assert_eq!(ids, vec![0, 1, 3, 4]);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    #[should_panic(expected = "has been removed")]
    fn test_index_removed_node_panics() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());
        graph.remove_node(a);
        let _ = graph[a];
    }
}
