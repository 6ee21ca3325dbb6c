//! Delete-set resolution and the delete pass
//!
//! Resolution walks a model's definition and decides, per trail, whether
//! instances found there may be removed. The delete pass then walks a result
//! tree carrying those flags and removes flagged vertices bottom-up inside a
//! single transaction.

use crate::catalog::Catalog;
use crate::compiler::{compile_delete_flags, compile_model_topology};
use crate::config::EngineContext;
use crate::definition::{ModelDef, ModelElementDef};
use crate::edge::{Direction, EdgeFilter};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphMutator, GraphStore};
use crate::result::ResultTree;
use crate::trail::TopologyMap;
use crate::traversal::{Collector, Visit, VisitHook};
use crate::vertex::{Vertex, VertexId};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Trail key → may instances at this trail be deleted
pub type DeleteFlags = BTreeMap<String, bool>;

/// Vertex id → `"<node-type> <id>"` for everything a delete removed
pub type RemovedVertices = BTreeMap<String, String>;

/// Resolve delete flags starting at a model's top element.
///
/// `override_model_id`/`override_model_version` bind the root step to that
/// persona. Flags for one trail reached several ways are merged so that
/// `false` wins.
pub fn resolve_deletable(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    top_element: &ModelElementDef,
    override_model_id: Option<&str>,
    override_model_version: Option<&str>,
) -> Result<DeleteFlags> {
    compile_delete_flags(store, ctx, top_element, override_model_id, override_model_version)
}

/// Resolve delete flags for a whole model
pub fn resolve_deletable_for_model(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    model: &ModelDef,
) -> Result<DeleteFlags> {
    if let Some(node_type) = model.widget_node_type() {
        let mut flags = DeleteFlags::new();
        flags.insert(node_type.to_string(), true);
        return Ok(flags);
    }
    let top = model.top_element(store)?;
    resolve_deletable(
        store,
        ctx,
        &top,
        Some(&model.model_id),
        Some(&model.model_version),
    )
}

struct DeleteFlagVisit<'f> {
    flags: &'f DeleteFlags,
}

impl VisitHook for DeleteFlagVisit<'_> {
    fn visit(&mut self, _store: &dyn GraphStore, node: &mut ResultTree) -> Result<Visit> {
        node.delete = self.flags.get(&node.trail).copied().unwrap_or(false);
        Ok(Visit::Expand)
    }
}

/// Collect the instance tree under `root` with each node's delete flag set
pub fn collect_with_delete_flags(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    root: &Vertex,
    topology: &TopologyMap,
    flags: &DeleteFlags,
) -> Result<ResultTree> {
    let mut collector = Collector::new(store, ctx, topology, DeleteFlagVisit { flags });
    collector
        .collect_from(root.clone())?
        .ok_or_else(|| Error::Internal(format!("{} dropped from its own walk", root.describe())))
}

/// Plan a model-driven delete: the instance tree with delete flags, nothing
/// removed
pub fn plan_delete(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    root: &Vertex,
    model: &ModelDef,
) -> Result<ResultTree> {
    let topology = compile_model_topology(store, ctx, model)?;
    let flags = resolve_deletable_for_model(store, ctx, model)?;
    collect_with_delete_flags(store, ctx, root, &topology, &flags)
}

struct DeletePass<'a> {
    tx: &'a mut dyn GraphMutator,
    catalog: &'a Catalog,
    processed: HashSet<VertexId>,
    removed: RemovedVertices,
}

impl DeletePass<'_> {
    fn visit(&mut self, node: &ResultTree) {
        for child in &node.children {
            self.visit(child);
        }
        if node.delete {
            if let Err(e) = self.remove(node.id()) {
                warn!("Skipping {}: {}", node.vertex.describe(), e);
            }
        }
    }

    /// Remove a vertex after everything that depends on it
    fn remove(&mut self, id: &VertexId) -> Result<()> {
        if !self.processed.insert(id.clone()) {
            return Ok(());
        }
        let vertex = match self.tx.get_vertex(id.as_str()) {
            Ok(vertex) => vertex,
            Err(e) if e.is_not_found() => {
                debug!("{} already removed", id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let catalog = self.catalog;
        let dependent_types = catalog.edge_rules().dependent_node_types(&vertex.node_type);
        if !dependent_types.is_empty() {
            let dependents = self
                .tx
                .adjacent(id.as_str(), Direction::Both, &EdgeFilter::Any)?;
            for dependent in dependents
                .into_iter()
                .filter(|v| dependent_types.contains(&v.node_type.as_str()))
            {
                if let Err(e) = self.remove(&dependent.id) {
                    warn!("Skipping dependent {}: {}", dependent.describe(), e);
                }
            }
        }

        let removed = self.tx.remove_vertex(id.as_str())?;
        self.removed.insert(removed.id.to_string(), removed.describe());
        Ok(())
    }
}

/// Remove every flagged vertex of `tree`, children before parents.
///
/// Vertices already gone are skipped. Per-node failures are logged and
/// skipped, except at the root: a missing root or a `resource_version`
/// mismatch fails the whole pass before anything is removed.
pub fn execute_delete(
    tx: &mut dyn GraphMutator,
    catalog: &Catalog,
    tree: &ResultTree,
    resource_version: Option<&str>,
) -> Result<RemovedVertices> {
    let root_id = tree.id();
    let root = match tx.get_vertex(root_id.as_str()) {
        Ok(root) => root,
        Err(e) if e.is_not_found() => return Err(Error::RootAlreadyRemoved(root_id.to_string())),
        Err(e) => return Err(e),
    };
    if let Some(expected) = resource_version {
        let found = root.resource_version().unwrap_or_default();
        if found != expected {
            return Err(Error::ResourceVersionMismatch {
                id: root_id.to_string(),
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }

    let mut pass = DeletePass {
        tx,
        catalog,
        processed: HashSet::new(),
        removed: RemovedVertices::new(),
    };
    for child in &tree.children {
        pass.visit(child);
    }
    if tree.delete {
        pass.remove(root_id)?;
    }
    Ok(pass.removed)
}

/// Resolve, collect and delete one model instance in a single transaction
pub fn delete_model_instance(
    graph: &mut Graph,
    ctx: &EngineContext,
    root_id: &str,
    model: &ModelDef,
    resource_version: Option<&str>,
) -> Result<RemovedVertices> {
    let root = graph.get_vertex(root_id)?;
    let tree = plan_delete(&*graph, ctx, &root, model)?;

    let mut tx = graph.begin_transaction();
    match execute_delete(&mut tx, &ctx.catalog, &tree, resource_version) {
        Ok(removed) => {
            tx.commit();
            info!("Deleted {} vertices under {}", removed.len(), root.describe());
            Ok(removed)
        }
        Err(e) => {
            tx.rollback();
            Err(e)
        }
    }
}
