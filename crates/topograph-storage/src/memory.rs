//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;
use topograph_core::{Edge, EdgeId, Vertex, VertexId};

/// In-memory storage backend
///
/// Useful for testing and temporary storage.
pub struct MemoryStorage {
    vertices: RwLock<BTreeMap<VertexId, Vertex>>,
    edges: RwLock<BTreeMap<EdgeId, Edge>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            vertices: RwLock::new(BTreeMap::new()),
            edges: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(format!("Lock error: {}", e))
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    // Vertex operations

    async fn save_vertex(&self, vertex: &Vertex) -> StorageResult<()> {
        let mut vertices = self.vertices.write().map_err(lock_error)?;
        vertices.insert(vertex.id.clone(), vertex.clone());
        Ok(())
    }

    async fn get_vertex(&self, id: &str) -> StorageResult<Option<Vertex>> {
        let vertices = self.vertices.read().map_err(lock_error)?;
        Ok(vertices.get(id).cloned())
    }

    async fn get_all_vertices(&self) -> StorageResult<Vec<Vertex>> {
        let vertices = self.vertices.read().map_err(lock_error)?;
        Ok(vertices.values().cloned().collect())
    }

    async fn delete_vertex(&self, id: &str) -> StorageResult<()> {
        {
            let mut vertices = self.vertices.write().map_err(lock_error)?;
            if vertices.remove(id).is_none() {
                return Err(StorageError::VertexNotFound(id.to_string()));
            }
        }
        let mut edges = self.edges.write().map_err(lock_error)?;
        edges.retain(|_, e| e.out_id.as_str() != id && e.in_id.as_str() != id);
        Ok(())
    }

    async fn delete_vertices_batch(&self, ids: &[&str]) -> StorageResult<()> {
        {
            let mut vertices = self.vertices.write().map_err(lock_error)?;
            if let Some(missing) = ids.iter().find(|id| !vertices.contains_key(**id)) {
                return Err(StorageError::VertexNotFound(missing.to_string()));
            }
            for id in ids {
                vertices.remove(*id);
            }
        }
        let mut edges = self.edges.write().map_err(lock_error)?;
        edges.retain(|_, e| !ids.contains(&e.out_id.as_str()) && !ids.contains(&e.in_id.as_str()));
        Ok(())
    }

    // Edge operations

    async fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        {
            let vertices = self.vertices.read().map_err(lock_error)?;
            for end in [&edge.out_id, &edge.in_id] {
                if !vertices.contains_key(end) {
                    return Err(StorageError::VertexNotFound(end.to_string()));
                }
            }
        }
        let mut edges = self.edges.write().map_err(lock_error)?;
        edges.insert(edge.id.clone(), edge.clone());
        Ok(())
    }

    async fn get_edges_for_vertex(&self, vertex_id: &str) -> StorageResult<Vec<Edge>> {
        let edges = self.edges.read().map_err(lock_error)?;
        Ok(edges
            .values()
            .filter(|e| e.out_id.as_str() == vertex_id || e.in_id.as_str() == vertex_id)
            .cloned()
            .collect())
    }

    async fn get_all_edges(&self) -> StorageResult<Vec<Edge>> {
        let edges = self.edges.read().map_err(lock_error)?;
        Ok(edges.values().cloned().collect())
    }

    async fn delete_edge(&self, id: &EdgeId) -> StorageResult<()> {
        let mut edges = self.edges.write().map_err(lock_error)?;
        edges.remove(id);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.edges.write().map_err(lock_error)?.clear();
        self.vertices.write().map_err(lock_error)?.clear();
        Ok(())
    }
}
