//! Storage backend trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use topograph_core::{Edge, EdgeId, Graph, Vertex};

/// Trait for storage backend implementations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Close the storage connection
    async fn close(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Vertex Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Save (insert or replace) a vertex
    async fn save_vertex(&self, vertex: &Vertex) -> StorageResult<()>;

    /// Get a vertex by id
    async fn get_vertex(&self, id: &str) -> StorageResult<Option<Vertex>>;

    /// Get every stored vertex
    async fn get_all_vertices(&self) -> StorageResult<Vec<Vertex>>;

    /// Delete a vertex together with every edge touching it
    async fn delete_vertex(&self, id: &str) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Save (insert or replace) an edge
    async fn save_edge(&self, edge: &Edge) -> StorageResult<()>;

    /// Get edges touching a vertex, in either direction
    async fn get_edges_for_vertex(&self, vertex_id: &str) -> StorageResult<Vec<Edge>>;

    /// Get every stored edge
    async fn get_all_edges(&self) -> StorageResult<Vec<Edge>>;

    /// Delete an edge
    async fn delete_edge(&self, id: &EdgeId) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Clear all stored vertices and edges
    async fn clear(&self) -> StorageResult<()>;

    /// Save multiple vertices in a single transaction
    async fn save_vertices_batch(&self, vertices: &[Vertex]) -> StorageResult<()> {
        for vertex in vertices {
            self.save_vertex(vertex).await?;
        }
        Ok(())
    }

    /// Delete multiple vertices and every edge touching them in a single
    /// transaction. Nothing is removed if any id is missing.
    async fn delete_vertices_batch(&self, ids: &[&str]) -> StorageResult<()>;

    /// Save multiple edges in a single transaction
    async fn save_edges_batch(&self, edges: &[Edge]) -> StorageResult<()> {
        for edge in edges {
            self.save_edge(edge).await?;
        }
        Ok(())
    }

    /// Load the whole graph into memory
    async fn load_graph(&self) -> StorageResult<Graph> {
        let vertices = self.get_all_vertices().await?;
        let edges = self.get_all_edges().await?;
        let graph = Graph::from_parts(vertices, edges)?;
        tracing::debug!(
            "Loaded graph: {} vertices, {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Save the whole graph (replaces existing contents)
    async fn save_graph(&self, graph: &Graph) -> StorageResult<()> {
        let snapshot = graph.snapshot();
        self.clear().await?;
        self.save_vertices_batch(&snapshot.vertices).await?;
        self.save_edges_batch(&snapshot.edges).await?;
        Ok(())
    }
}
