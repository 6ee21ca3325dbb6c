//! Bounded-time query service
//!
//! Read queries run on a blocking worker while the caller waits up to the
//! configured time limit. On expiry the worker is abandoned and the caller
//! gets [`Error::Timeout`]; the worker only reads, so letting it finish in
//! the background is harmless. Deletes take the write lock and are not
//! time-bounded.

use crate::compiler::compile_model_topology;
use crate::config::EngineContext;
use crate::definition::find_model;
use crate::delete::{self, DeleteFlags, RemovedVertices};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphSnapshot, GraphStore};
use crate::named_query::{evaluate_named_query, NamedQueryRequest};
use crate::result::ResultTree;
use crate::trail::TopologyMap;
use crate::traversal::collect_instance;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, error};

/// Run `work` on a blocking worker, giving up after `limit`.
///
/// Generic over the worker's error so callers with their own error type
/// share the same limit; engine failures convert through `From<Error>`.
pub async fn run_with_time_limit<T, E, F>(limit: Duration, work: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<Error> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            Err(Error::Internal(format!("query worker failed: {}", join_error)).into())
        }
        Err(_) => {
            error!("Query exceeded time limit of {}s", limit.as_secs());
            Err(Error::Timeout {
                secs: limit.as_secs(),
            }
            .into())
        }
    }
}

/// Shared handle for running queries against one graph
#[derive(Debug, Clone)]
pub struct QueryService {
    graph: Arc<RwLock<Graph>>,
    ctx: Arc<EngineContext>,
}

fn read(graph: &RwLock<Graph>) -> Result<RwLockReadGuard<'_, Graph>> {
    graph
        .read()
        .map_err(|_| Error::Internal("graph lock poisoned".to_string()))
}

fn write(graph: &RwLock<Graph>) -> Result<RwLockWriteGuard<'_, Graph>> {
    graph
        .write()
        .map_err(|_| Error::Internal("graph lock poisoned".to_string()))
}

impl QueryService {
    pub fn new(graph: Graph, ctx: EngineContext) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
            ctx: Arc::new(ctx),
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Copy of the current graph contents
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(read(&self.graph)?.snapshot())
    }

    async fn bounded<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Graph, &EngineContext) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let graph = Arc::clone(&self.graph);
        let ctx = Arc::clone(&self.ctx);
        run_with_time_limit(self.ctx.config.time_limit(), move || {
            let guard = read(&graph)?;
            work(&guard, &ctx)
        })
        .await
    }

    /// Compile a model's topology
    pub async fn compile_model(&self, model_id: &str, model_version: &str) -> Result<TopologyMap> {
        let (model_id, model_version) = (model_id.to_string(), model_version.to_string());
        self.bounded(move |graph, ctx| {
            let model = find_model(graph, &model_id, &model_version)?;
            compile_model_topology(graph, ctx, &model)
        })
        .await
    }

    /// Compile a model and walk the instance under `root_id`
    pub async fn query_by_model(
        &self,
        root_id: &str,
        model_id: &str,
        model_version: &str,
    ) -> Result<ResultTree> {
        let root_id = root_id.to_string();
        let (model_id, model_version) = (model_id.to_string(), model_version.to_string());
        self.bounded(move |graph, ctx| {
            let model = find_model(graph, &model_id, &model_version)?;
            let topology = compile_model_topology(graph, ctx, &model)?;
            let root = graph.get_vertex(&root_id)?;
            debug!("Model query {} {} from {}", model_id, model_version, root.describe());
            collect_instance(graph, ctx, &root, &topology)
        })
        .await
    }

    /// Evaluate a named query
    pub async fn query_named(&self, request: NamedQueryRequest) -> Result<Vec<ResultTree>> {
        self.bounded(move |graph, ctx| evaluate_named_query(graph, ctx, &request))
            .await
    }

    /// Per-trail delete flags for a model
    pub async fn delete_flags(&self, model_id: &str, model_version: &str) -> Result<DeleteFlags> {
        let (model_id, model_version) = (model_id.to_string(), model_version.to_string());
        self.bounded(move |graph, ctx| {
            let model = find_model(graph, &model_id, &model_version)?;
            delete::resolve_deletable_for_model(graph, ctx, &model)
        })
        .await
    }

    /// The instance tree under `root_id` with delete flags, nothing removed
    pub async fn plan_delete(
        &self,
        root_id: &str,
        model_id: &str,
        model_version: &str,
    ) -> Result<ResultTree> {
        let root_id = root_id.to_string();
        let (model_id, model_version) = (model_id.to_string(), model_version.to_string());
        self.bounded(move |graph, ctx| {
            let model = find_model(graph, &model_id, &model_version)?;
            let root = graph.get_vertex(&root_id)?;
            delete::plan_delete(graph, ctx, &root, &model)
        })
        .await
    }

    /// Delete the model instance under `root_id` in one transaction
    pub async fn delete_by_model(
        &self,
        root_id: &str,
        model_id: &str,
        model_version: &str,
        resource_version: Option<String>,
    ) -> Result<RemovedVertices> {
        let graph = Arc::clone(&self.graph);
        let ctx = Arc::clone(&self.ctx);
        let root_id = root_id.to_string();
        let (model_id, model_version) = (model_id.to_string(), model_version.to_string());
        tokio::task::spawn_blocking(move || {
            let mut guard = write(&graph)?;
            let model = find_model(&*guard, &model_id, &model_version)?;
            delete::delete_model_instance(
                &mut guard,
                &ctx,
                &root_id,
                &model,
                resource_version.as_deref(),
            )
        })
        .await
        .map_err(|e| Error::Internal(format!("delete worker failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{context, service_model};
    use crate::error::ErrorKind;
    use crate::vertex::Vertex;

    fn service() -> QueryService {
        let mut graph = Graph::new();
        service_model(&mut graph);
        graph.add_vertex(Vertex::new("s1", "service-instance").with_persona("svc", "1.0"));
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("i1", "l-interface"));
        graph.connect("s1", "v1", "uses").unwrap();
        graph.connect("v1", "i1", "has").unwrap();
        QueryService::new(graph, context())
    }

    #[tokio::test]
    async fn test_query_by_model() {
        let service = service();
        let tree = service.query_by_model("s1", "svc", "1.0").await.unwrap();
        assert_eq!(tree.vertex_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_plan_then_delete() {
        let service = service();
        let flags = service.delete_flags("svc", "1.0").await.unwrap();
        assert!(flags.values().all(|delete| *delete));

        let plan = service.plan_delete("s1", "svc", "1.0").await.unwrap();
        assert!(plan.delete);
        assert!(plan.children[0].delete);

        let removed = service
            .delete_by_model("s1", "svc", "1.0", None)
            .await
            .unwrap();
        assert_eq!(removed.len(), 3);
        let err = service.query_by_model("s1", "svc", "1.0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_time_limit_expires() {
        let err = run_with_time_limit(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(500));
            Ok::<_, Error>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    }

    #[tokio::test]
    async fn test_time_limit_passes_result_through() {
        let value = run_with_time_limit(Duration::from_secs(5), || Ok::<_, Error>(7)).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let service = service();
        let err = service.compile_model("nope", "1.0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
