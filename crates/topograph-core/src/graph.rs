//! Graph store contract and the in-memory property graph

use crate::edge::{Direction, Edge, EdgeFilter, EdgeId};
use crate::error::{Error, Result};
use crate::vertex::{Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read contract the traversal engine needs from a graph store
pub trait GraphStore {
    /// Get a vertex by id, `Error::VertexNotFound` on a miss
    fn get_vertex(&self, id: &str) -> Result<Vertex>;

    /// Vertices of a node type matching every filter exactly
    fn find_vertices(&self, node_type: &str, filters: &[(&str, &str)]) -> Result<Vec<Vertex>>;

    /// Edges touching a vertex in the given direction
    fn edges(&self, id: &str, direction: Direction) -> Result<Vec<Edge>>;

    /// Vertices adjacent to `id` over edges accepted by `filter`
    fn adjacent(&self, id: &str, direction: Direction, filter: &EdgeFilter) -> Result<Vec<Vertex>> {
        let mut out = Vec::new();
        for edge in self.edges(id, direction)? {
            if !filter.accepts(&edge) {
                continue;
            }
            if let Some(other) = edge.other_end(id) {
                out.push(self.get_vertex(other.as_str())?);
            }
        }
        Ok(out)
    }

    fn contains_vertex(&self, id: &str) -> bool {
        self.get_vertex(id).is_ok()
    }
}

/// Mutations used by the delete pass
pub trait GraphMutator: GraphStore {
    /// Remove a vertex together with every edge touching it
    fn remove_vertex(&mut self, id: &str) -> Result<Vertex>;
}

/// Flat, serializable form of a graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// In-memory property graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, Edge>,
    adjacency: HashMap<VertexId, Vec<EdgeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from vertices and edges, rejecting dangling edges
    pub fn from_parts(vertices: Vec<Vertex>, edges: Vec<Edge>) -> Result<Self> {
        let mut graph = Self::new();
        for vertex in vertices {
            graph.add_vertex(vertex);
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        Self::from_parts(snapshot.vertices, snapshot.edges)
    }

    /// Vertices and edges sorted by id
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut vertices: Vec<Vertex> = self.vertices.values().cloned().collect();
        vertices.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<Edge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        GraphSnapshot { vertices, edges }
    }

    pub fn add_vertex(&mut self, vertex: Vertex) {
        self.adjacency.entry(vertex.id.clone()).or_default();
        self.vertices.insert(vertex.id.clone(), vertex);
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeId> {
        for end in [&edge.out_id, &edge.in_id] {
            if !self.vertices.contains_key(end) {
                return Err(Error::VertexNotFound(end.to_string()));
            }
        }
        let id = edge.id.clone();
        self.adjacency
            .entry(edge.out_id.clone())
            .or_default()
            .push(id.clone());
        if edge.in_id != edge.out_id {
            self.adjacency
                .entry(edge.in_id.clone())
                .or_default()
                .push(id.clone());
        }
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Convenience for building graphs: connect two vertices by label
    pub fn connect(&mut self, out_id: &str, in_id: &str, label: &str) -> Result<EdgeId> {
        self.add_edge(Edge::new(out_id, in_id, label))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Start a transaction over a staged copy of this graph
    pub fn begin_transaction(&mut self) -> Transaction<'_> {
        let staged = self.clone();
        Transaction { base: self, staged }
    }
}

impl GraphStore for Graph {
    fn get_vertex(&self, id: &str) -> Result<Vertex> {
        self.vertices
            .get(id)
            .cloned()
            .ok_or_else(|| Error::VertexNotFound(id.to_string()))
    }

    fn find_vertices(&self, node_type: &str, filters: &[(&str, &str)]) -> Result<Vec<Vertex>> {
        let mut found: Vec<Vertex> = self
            .vertices
            .values()
            .filter(|v| v.node_type == node_type && v.matches_filters(filters))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    fn edges(&self, id: &str, direction: Direction) -> Result<Vec<Edge>> {
        let ids = self
            .adjacency
            .get(id)
            .ok_or_else(|| Error::VertexNotFound(id.to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|eid| self.edges.get(eid))
            .filter(|e| e.runs(id, direction))
            .cloned()
            .collect())
    }

    fn contains_vertex(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }
}

impl GraphMutator for Graph {
    fn remove_vertex(&mut self, id: &str) -> Result<Vertex> {
        let vertex = self
            .vertices
            .remove(id)
            .ok_or_else(|| Error::VertexNotFound(id.to_string()))?;
        let edge_ids = self.adjacency.remove(id).unwrap_or_default();
        for eid in edge_ids {
            if let Some(edge) = self.edges.remove(&eid) {
                if let Some(other) = edge.other_end(id) {
                    if let Some(list) = self.adjacency.get_mut(other) {
                        list.retain(|e| *e != eid);
                    }
                }
            }
        }
        Ok(vertex)
    }
}

/// A unit of mutation over a [`Graph`].
///
/// Changes are applied to a staged copy and only become visible on
/// [`Transaction::commit`]. Dropping the transaction discards them.
pub struct Transaction<'g> {
    base: &'g mut Graph,
    staged: Graph,
}

impl Transaction<'_> {
    pub fn commit(self) {
        tracing::debug!(
            "Committing transaction: {} vertices, {} edges",
            self.staged.vertex_count(),
            self.staged.edge_count()
        );
        *self.base = self.staged;
    }

    pub fn rollback(self) {
        tracing::debug!("Rolling back transaction");
    }
}

impl GraphStore for Transaction<'_> {
    fn get_vertex(&self, id: &str) -> Result<Vertex> {
        self.staged.get_vertex(id)
    }

    fn find_vertices(&self, node_type: &str, filters: &[(&str, &str)]) -> Result<Vec<Vertex>> {
        self.staged.find_vertices(node_type, filters)
    }

    fn edges(&self, id: &str, direction: Direction) -> Result<Vec<Edge>> {
        self.staged.edges(id, direction)
    }

    fn contains_vertex(&self, id: &str) -> bool {
        self.staged.contains_vertex(id)
    }
}

impl GraphMutator for Transaction<'_> {
    fn remove_vertex(&mut self, id: &str) -> Result<Vertex> {
        self.staged.remove_vertex(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("i1", "l-interface").with_property("interface-name", "eth0"));
        graph.add_vertex(Vertex::new("i2", "l-interface").with_property("interface-name", "eth1"));
        graph.add_vertex(Vertex::new("t1", "tenant"));
        graph.connect("v1", "i1", "has").unwrap();
        graph.connect("v1", "i2", "has").unwrap();
        graph.connect("v1", "t1", "owned-by").unwrap();
        graph
    }

    #[test]
    fn test_find_vertices() {
        let graph = create_test_graph();
        let found = graph
            .find_vertices("l-interface", &[("interface-name", "eth1")])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "i2");

        let all = graph.find_vertices("l-interface", &[]).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_adjacent_by_direction_and_label() {
        let graph = create_test_graph();

        let out = graph
            .adjacent("v1", Direction::Outgoing, &EdgeFilter::Label("has".into()))
            .unwrap();
        assert_eq!(out.len(), 2);

        let back = graph
            .adjacent("t1", Direction::Incoming, &EdgeFilter::Any)
            .unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id.as_str(), "v1");

        let none = graph
            .adjacent("t1", Direction::Outgoing, &EdgeFilter::Any)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("a", "x"));
        assert!(graph.connect("a", "missing", "rel").is_err());
    }

    #[test]
    fn test_remove_vertex_drops_edges() {
        let mut graph = create_test_graph();
        graph.remove_vertex("v1").unwrap();

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.adjacent("i1", Direction::Both, &EdgeFilter::Any).unwrap().is_empty());
        assert!(matches!(graph.remove_vertex("v1"), Err(Error::VertexNotFound(_))));
    }

    #[test]
    fn test_transaction_commit_and_rollback() {
        let mut graph = create_test_graph();

        let mut tx = graph.begin_transaction();
        tx.remove_vertex("i1").unwrap();
        assert!(!tx.contains_vertex("i1"));
        tx.rollback();
        assert!(graph.contains_vertex("i1"));

        let mut tx = graph.begin_transaction();
        tx.remove_vertex("i1").unwrap();
        tx.commit();
        assert!(!graph.contains_vertex("i1"));
        assert_eq!(graph.vertex_count(), 3);
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_counts() {
        let graph = create_test_graph();
        let rebuilt = Graph::from_snapshot(graph.snapshot()).unwrap();
        assert_eq!(rebuilt.vertex_count(), 4);
        assert_eq!(rebuilt.edge_count(), 3);
    }
}
