//! Instance traversal: walk live vertices along a compiled topology

use crate::config::EngineContext;
use crate::edge::{Direction, EdgeFilter};
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::result::ResultTree;
use crate::trail::{TopologyMap, Trail};
use crate::vertex::{Vertex, VertexId};
use std::collections::HashSet;
use tracing::{debug, error};

/// What the collector does with a node after its hook ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep the node and descend into its neighbours
    Expand,
    /// Keep the node, do not descend
    Leaf,
    /// Leave the node and everything under it out of the result
    Drop,
}

/// Per-node hook run as each result node is created
pub trait VisitHook {
    /// Decorate `node` and decide how the walk continues from it
    fn visit(&mut self, store: &dyn GraphStore, node: &mut ResultTree) -> Result<Visit>;
}

/// Hook that leaves nodes untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainVisit;

impl VisitHook for PlainVisit {
    fn visit(&mut self, _store: &dyn GraphStore, _node: &mut ResultTree) -> Result<Visit> {
        Ok(Visit::Expand)
    }
}

/// Walks instances from one or more roots.
///
/// The visited set is per root; the result count spans every root the
/// collector is used for.
pub struct Collector<'a, H: VisitHook> {
    store: &'a dyn GraphStore,
    ctx: &'a EngineContext,
    topology: &'a TopologyMap,
    hook: H,
    visited: HashSet<VertexId>,
    count: usize,
}

impl<'a, H: VisitHook> Collector<'a, H> {
    pub fn new(
        store: &'a dyn GraphStore,
        ctx: &'a EngineContext,
        topology: &'a TopologyMap,
        hook: H,
    ) -> Self {
        Self {
            store,
            ctx,
            topology,
            hook,
            visited: HashSet::new(),
            count: 0,
        }
    }

    /// Nodes collected so far across all roots
    pub fn count(&self) -> usize {
        self.count
    }

    /// Collect the tree under `root`, which must be of the topology's root
    /// node type. `None` when the hook drops the root itself.
    pub fn collect_from(&mut self, root: Vertex) -> Result<Option<ResultTree>> {
        let expected = &self.topology.root_step().node_type;
        if &root.node_type != expected {
            return Err(Error::RootTypeMismatch {
                expected: expected.clone(),
                found: root.node_type,
            });
        }
        self.visited.clear();
        self.visited.insert(root.id.clone());
        let trail = self.topology.root_trail();
        self.collect(root, trail, 0)
    }

    fn collect(&mut self, vertex: Vertex, trail: Trail, depth: u32) -> Result<Option<ResultTree>> {
        let max_levels = self.ctx.max_levels();
        if depth > max_levels {
            error!("Traversal from {} exceeded {} levels", vertex.describe(), max_levels);
            return Err(Error::DepthExceeded { max: max_levels });
        }
        self.count += 1;
        let max_results = self.ctx.max_result_count();
        if self.count > max_results {
            error!("Result set exceeded {} nodes", max_results);
            return Err(Error::ResultLimitExceeded { max: max_results });
        }

        let mut node = ResultTree::new(vertex, trail.key());
        match self.hook.visit(self.store, &mut node)? {
            Visit::Expand => {}
            Visit::Leaf => return Ok(Some(node)),
            Visit::Drop => return Ok(None),
        }
        let topology = self.topology;
        if depth > 0 && topology.root_step().matches_vertex(&node.vertex) {
            debug!("{} repeats the root type, not expanding", node.vertex.describe());
            return Ok(Some(node));
        }

        let mut steps = topology.next_steps(&trail).peekable();
        if steps.peek().is_none() {
            return Ok(Some(node));
        }
        let neighbours =
            self.store
                .adjacent(node.vertex.id.as_str(), Direction::Both, &EdgeFilter::Any)?;
        for step in steps {
            for candidate in neighbours.iter().filter(|v| step.matches_vertex(v)) {
                if !self.visited.insert(candidate.id.clone()) {
                    continue;
                }
                let child = self.collect(candidate.clone(), trail.extend(step.clone()), depth + 1)?;
                node.children.extend(child);
            }
        }
        Ok(Some(node))
    }
}

/// Walk the instance tree under `root` following `topology`
pub fn collect_instance(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    root: &Vertex,
    topology: &TopologyMap,
) -> Result<ResultTree> {
    let mut collector = Collector::new(store, ctx, topology, PlainVisit);
    let tree = collector
        .collect_from(root.clone())?
        .ok_or_else(|| Error::Internal(format!("{} dropped from its own walk", root.describe())))?;
    debug!("Collected {} nodes under {}", collector.count(), root.describe());
    Ok(tree)
}
