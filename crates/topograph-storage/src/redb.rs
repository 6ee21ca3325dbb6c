//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Mutex;
use topograph_core::{Edge, EdgeId, Vertex};

// Table definitions
const VERTICES: TableDefinition<&str, &[u8]> = TableDefinition::new("vertices");
const EDGES: TableDefinition<&str, &[u8]> = TableDefinition::new("edges");

/// ReDB storage backend
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        // Initialize tables
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| StorageError::Database(e.to_string()))?;
            {
                let _ = write_txn.open_table(VERTICES)?;
                let _ = write_txn.open_table(EDGES)?;
            }
            write_txn.commit()?;
        }

        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Keys of edges touching a vertex
    fn edge_keys_for_vertex(
        table: &impl ReadableTable<&'static str, &'static [u8]>,
        vertex_id: &str,
    ) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let edge: Edge = serde_json::from_slice(value.value())?;
            if edge.out_id.as_str() == vertex_id || edge.in_id.as_str() == vertex_id {
                keys.push(key.value().to_string());
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn save_vertex(&self, vertex: &Vertex) -> StorageResult<()> {
        let value = serde_json::to_vec(vertex)?;

        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(VERTICES)?;
            table.insert(vertex.id.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn get_vertex(&self, id: &str) -> StorageResult<Option<Vertex>> {
        let db = self.lock()?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(VERTICES)?;

        if let Some(value) = table.get(id)? {
            let vertex: Vertex = serde_json::from_slice(value.value())?;
            Ok(Some(vertex))
        } else {
            Ok(None)
        }
    }

    async fn get_all_vertices(&self) -> StorageResult<Vec<Vertex>> {
        let db = self.lock()?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(VERTICES)?;

        let mut vertices = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            vertices.push(serde_json::from_slice(value.value())?);
        }

        Ok(vertices)
    }

    async fn delete_vertex(&self, id: &str) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut vertices = write_txn.open_table(VERTICES)?;
            if vertices.remove(id)?.is_none() {
                return Err(StorageError::VertexNotFound(id.to_string()));
            }
        }
        {
            let mut edges = write_txn.open_table(EDGES)?;
            let keys = Self::edge_keys_for_vertex(&edges, id)?;
            for key in keys {
                edges.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let value = serde_json::to_vec(edge)?;

        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let vertices = write_txn.open_table(VERTICES)?;
            for end in [&edge.out_id, &edge.in_id] {
                if vertices.get(end.as_str())?.is_none() {
                    return Err(StorageError::VertexNotFound(end.to_string()));
                }
            }
        }
        {
            let mut table = write_txn.open_table(EDGES)?;
            table.insert(edge.id.0.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn get_edges_for_vertex(&self, vertex_id: &str) -> StorageResult<Vec<Edge>> {
        let db = self.lock()?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(EDGES)?;

        let mut edges = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let edge: Edge = serde_json::from_slice(value.value())?;
            if edge.out_id.as_str() == vertex_id || edge.in_id.as_str() == vertex_id {
                edges.push(edge);
            }
        }

        Ok(edges)
    }

    async fn get_all_edges(&self) -> StorageResult<Vec<Edge>> {
        let db = self.lock()?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(EDGES)?;

        let mut edges = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            edges.push(serde_json::from_slice(value.value())?);
        }

        Ok(edges)
    }

    async fn delete_edge(&self, id: &EdgeId) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(EDGES)?;
            table.remove(id.0.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        write_txn.delete_table(EDGES)?;
        write_txn.delete_table(VERTICES)?;
        {
            let _ = write_txn.open_table(VERTICES)?;
            let _ = write_txn.open_table(EDGES)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn save_vertices_batch(&self, vertices: &[Vertex]) -> StorageResult<()> {
        if vertices.is_empty() {
            return Ok(());
        }

        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(VERTICES)?;
            for vertex in vertices {
                let value = serde_json::to_vec(vertex)?;
                table.insert(vertex.id.as_str(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        tracing::debug!(
            "Batch saved {} vertices in single transaction",
            vertices.len()
        );

        Ok(())
    }

    async fn delete_vertices_batch(&self, ids: &[&str]) -> StorageResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        // Returning before commit aborts the transaction
        {
            let mut vertices = write_txn.open_table(VERTICES)?;
            for id in ids {
                if vertices.remove(*id)?.is_none() {
                    return Err(StorageError::VertexNotFound(id.to_string()));
                }
            }
        }
        {
            let mut edges = write_txn.open_table(EDGES)?;
            let mut keys = Vec::new();
            for entry in edges.iter()? {
                let (key, value) = entry?;
                let edge: Edge = serde_json::from_slice(value.value())?;
                if ids.contains(&edge.out_id.as_str()) || ids.contains(&edge.in_id.as_str()) {
                    keys.push(key.value().to_string());
                }
            }
            for key in keys {
                edges.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        tracing::debug!("Batch deleted {} vertices in single transaction", ids.len());

        Ok(())
    }

    async fn save_edges_batch(&self, edges: &[Edge]) -> StorageResult<()> {
        if edges.is_empty() {
            return Ok(());
        }

        let db = self.lock()?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(EDGES)?;
            for edge in edges {
                let value = serde_json::to_vec(edge)?;
                table.insert(edge.id.0.as_str(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        tracing::debug!("Batch saved {} edges in single transaction", edges.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use topograph_core::{Graph, GraphStore};

    #[tokio::test]
    async fn test_redb_storage() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        let storage = RedbStorage::open(&db_path).unwrap();
        storage.initialize().await.unwrap();

        storage.save_vertex(&Vertex::new("v1", "vserver")).await.unwrap();
        storage.save_vertex(&Vertex::new("i1", "l-interface")).await.unwrap();
        storage.save_edge(&Edge::new("v1", "i1", "has")).await.unwrap();

        let retrieved = storage.get_vertex("v1").await.unwrap();
        assert_eq!(retrieved.unwrap().node_type, "vserver");
        assert_eq!(storage.get_edges_for_vertex("v1").await.unwrap().len(), 1);

        // Deleting a vertex drops its edges
        storage.delete_vertex("i1").await.unwrap();
        assert!(storage.get_vertex("i1").await.unwrap().is_none());
        assert!(storage.get_all_edges().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redb_graph_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("graph.redb");

        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("v1", "vserver").with_property("vserver-name", "web"));
        graph.add_vertex(Vertex::new("t1", "tenant"));
        graph.connect("v1", "t1", "owned-by").unwrap();

        {
            let storage = RedbStorage::open(&db_path).unwrap();
            storage.save_graph(&graph).await.unwrap();
        }

        let storage = RedbStorage::open(&db_path).unwrap();
        let loaded = storage.load_graph().await.unwrap();
        assert_eq!(loaded.vertex_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(
            loaded.get_vertex("v1").unwrap().property_str("vserver-name"),
            Some("web")
        );
    }

    #[tokio::test]
    async fn test_delete_vertices_batch() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("batch.redb")).unwrap();
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("i1", "l-interface"));
        graph.add_vertex(Vertex::new("t1", "tenant"));
        graph.connect("v1", "i1", "has").unwrap();
        graph.connect("v1", "t1", "owned-by").unwrap();
        storage.save_graph(&graph).await.unwrap();

        storage.delete_vertices_batch(&["i1", "v1"]).await.unwrap();

        let loaded = storage.load_graph().await.unwrap();
        assert_eq!(loaded.vertex_count(), 1);
        assert!(loaded.get_vertex("t1").is_ok());
        assert_eq!(loaded.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_vertices_batch_missing_id_removes_nothing() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("abort.redb")).unwrap();
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("i1", "l-interface"));
        graph.connect("v1", "i1", "has").unwrap();
        storage.save_graph(&graph).await.unwrap();

        let err = storage
            .delete_vertices_batch(&["i1", "s1", "v1"])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::VertexNotFound(ref id) if id == "s1"));

        let loaded = storage.load_graph().await.unwrap();
        assert_eq!(loaded.vertex_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_save_graph_replaces_contents() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("replace.redb")).unwrap();
        storage.save_vertex(&Vertex::new("old", "pserver")).await.unwrap();

        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("new", "pserver"));
        storage.save_graph(&graph).await.unwrap();

        assert!(storage.get_vertex("old").await.unwrap().is_none());
        assert!(storage.get_vertex("new").await.unwrap().is_some());
    }
}
