//! Topology compiler
//!
//! Turns a model or named-query definition into a [`TopologyMap`]: for every
//! trail reachable from the root, the set of node-type steps an instance
//! walk may take next. The same descent, run in delete mode, produces the
//! per-trail delete flags used by the delete pass.

use crate::config::EngineContext;
use crate::definition::{
    ConstraintScope, LinkagePath, ModelDef, ModelElementDef, NamedQueryDef, NamedQueryElementDef,
    PropertyConstraint, RelatedLookup,
};
use crate::delete::DeleteFlags;
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::trail::{Persona, TopologyMap, Trail, TrailStep};
use crate::vertex::VertexId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error};

/// What a descent records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Topology,
    DeleteFlags,
}

/// Per-trail instructions carried by a named query element
#[derive(Debug, Clone)]
pub struct ElementDirectives {
    pub element: NamedQueryElementDef,
    pub constraints: Vec<PropertyConstraint>,
    pub related_lookups: Vec<RelatedLookup>,
}

/// A compiled named query: the topology plus per-trail element directives
#[derive(Debug, Clone)]
pub struct NamedQueryTopology {
    pub map: TopologyMap,
    pub directives: HashMap<String, ElementDirectives>,
}

impl NamedQueryTopology {
    pub fn directives_for(&self, trail_key: &str) -> Option<&ElementDirectives> {
        self.directives.get(trail_key)
    }
}

fn check_depth(ctx: &EngineContext, depth: u32) -> Result<()> {
    let max = ctx.max_levels();
    if depth > max {
        error!("Model definition exceeds {} levels", max);
        return Err(Error::ModelTooDeep { max });
    }
    Ok(())
}

/// Trail step an instance of `model` occupies.
///
/// A widget stands for its own node type; a composite model stands where its
/// top element does, bound to the composite's persona when the node type
/// carries one.
pub fn model_step(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    model: &ModelDef,
    depth: u32,
) -> Result<TrailStep> {
    check_depth(ctx, depth)?;
    if let Some(node_type) = model.widget_node_type() {
        return Ok(TrailStep::new(node_type));
    }
    let top = model.top_element(store)?;
    let inner = model_step(store, ctx, &top.model(store)?, depth + 1)?;
    if ctx.catalog.supports_persona(&inner.node_type) {
        Ok(TrailStep::new(inner.node_type).with_persona(model.persona()))
    } else {
        Ok(inner)
    }
}

/// Trail/step pairs a linkage path adds below `trail`, each hop checked
/// against the edge rules. A leading hop naming the element's own node type
/// is the element itself and is skipped.
pub fn linkage_hops(
    ctx: &EngineContext,
    trail: &Trail,
    path: &LinkagePath,
) -> Result<Vec<(Trail, TrailStep)>> {
    let mut hops = Vec::with_capacity(path.steps.len());
    let mut current = trail.clone();
    let mut steps = path.steps.iter().peekable();
    if steps.peek().map(|h| h.as_str()) == Some(trail.last().node_type.as_str()) {
        steps.next();
    }
    for hop in steps {
        ctx.catalog
            .edge_rules()
            .require(&current.last().node_type, hop)?;
        let step = TrailStep::new(hop.as_str());
        let next = current.extend(step.clone());
        hops.push((current, step));
        current = next;
    }
    Ok(hops)
}

/// Depth-first walker over definition vertices
struct TopologyCompiler<'a> {
    store: &'a dyn GraphStore,
    ctx: &'a EngineContext,
    purpose: Purpose,
    map: TopologyMap,
    flags: DeleteFlags,
    visited: HashSet<(VertexId, String)>,
    ancestors: Vec<VertexId>,
}

impl<'a> TopologyCompiler<'a> {
    fn new(store: &'a dyn GraphStore, ctx: &'a EngineContext, root: TrailStep, purpose: Purpose) -> Self {
        Self {
            store,
            ctx,
            purpose,
            map: TopologyMap::new(root),
            flags: DeleteFlags::new(),
            visited: HashSet::new(),
            ancestors: Vec::new(),
        }
    }

    fn step_for_element(&self, element: &ModelElementDef, depth: u32) -> Result<TrailStep> {
        model_step(self.store, self.ctx, &element.model(self.store)?, depth)
    }

    fn record_flag(&mut self, trail: &Trail, flag: bool) {
        let entry = self.flags.entry(trail.key()).or_insert(flag);
        *entry = *entry && flag;
    }

    /// Walk `element`, already placed at `trail`
    fn walk_element(
        &mut self,
        element: &ModelElementDef,
        trail: &Trail,
        scope: &ConstraintScope,
        depth: u32,
    ) -> Result<()> {
        check_depth(self.ctx, depth)?;
        if self.ancestors.contains(&element.vertex_id) {
            error!("Model element {} is its own ancestor", element.vertex_id);
            return Err(Error::ModelCycle {
                element: element.vertex_id.to_string(),
            });
        }
        if !self
            .visited
            .insert((element.vertex_id.clone(), trail.key()))
        {
            return Ok(());
        }

        if self.purpose == Purpose::DeleteFlags && element.linkage_points.is_empty() {
            self.record_flag(trail, element.new_data_del_flag);
        }

        if !element.linkage_points.is_empty() {
            for path in &element.linkage_points {
                let hops = linkage_hops(self.ctx, trail, path)?;
                match self.purpose {
                    Purpose::Topology => {
                        for (from, step) in hops {
                            self.map.insert(&from, step);
                        }
                    }
                    Purpose::DeleteFlags => {
                        let end = match hops.last() {
                            Some((from, step)) => from.extend(step.clone()),
                            None => trail.clone(),
                        };
                        self.record_flag(&end, element.new_data_del_flag);
                    }
                }
            }
            debug!("Element {} ends at its linkage points", element.vertex_id);
            return Ok(());
        }

        let scope = scope.with_constraints(element.constraints(self.store)?);
        self.ancestors.push(element.vertex_id.clone());
        let walked = self.walk_children(element, trail, &scope, depth);
        self.ancestors.pop();
        walked
    }

    fn walk_children(
        &mut self,
        element: &ModelElementDef,
        trail: &Trail,
        scope: &ConstraintScope,
        depth: u32,
    ) -> Result<()> {
        let model = element.model(self.store)?;
        if model.kind.is_composite() {
            if self.purpose == Purpose::DeleteFlags && !element.new_data_del_flag {
                debug!(
                    "Skipping sub-model {} under element {}",
                    model.model_id, element.vertex_id
                );
            } else {
                let top = model.top_element(self.store)?;
                self.walk_element(&top, trail, scope, depth + 1)?;
            }
        }

        for connection in element.connections(self.store)? {
            for child in connection.resolve(self.store, scope)? {
                let step = self.step_for_element(&child, depth + 1)?;
                self.ctx
                    .catalog
                    .edge_rules()
                    .require(&trail.last().node_type, &step.node_type)?;
                self.map.insert(trail, step.clone());
                let child_trail = trail.extend(step);
                self.walk_element(&child, &child_trail, scope, depth + 1)?;
            }
        }
        Ok(())
    }

    fn walk_query_element(
        &mut self,
        element: &NamedQueryElementDef,
        trail: &Trail,
        depth: u32,
        directives: &mut HashMap<String, ElementDirectives>,
    ) -> Result<()> {
        check_depth(self.ctx, depth)?;
        if self.ancestors.contains(&element.vertex_id) {
            error!("Named query element {} is its own ancestor", element.vertex_id);
            return Err(Error::ModelCycle {
                element: element.vertex_id.to_string(),
            });
        }
        if !self
            .visited
            .insert((element.vertex_id.clone(), trail.key()))
        {
            return Ok(());
        }

        let constraints = element.property_constraints(self.store)?;
        let related_lookups = element.related_lookups(self.store)?;
        let entry = directives
            .entry(trail.key())
            .or_insert_with(|| ElementDirectives {
                element: element.clone(),
                constraints: Vec::new(),
                related_lookups: Vec::new(),
            });
        entry.constraints.extend(constraints);
        entry.related_lookups.extend(related_lookups);

        self.ancestors.push(element.vertex_id.clone());
        let walked = self.walk_query_children(element, trail, depth, directives);
        self.ancestors.pop();
        walked
    }

    fn walk_query_children(
        &mut self,
        element: &NamedQueryElementDef,
        trail: &Trail,
        depth: u32,
        directives: &mut HashMap<String, ElementDirectives>,
    ) -> Result<()> {
        for child in element.children(self.store)? {
            let step = model_step(self.store, self.ctx, &child.model(self.store)?, depth + 1)?;
            self.ctx
                .catalog
                .edge_rules()
                .require(&trail.last().node_type, &step.node_type)?;
            self.map.insert(trail, step.clone());
            let child_trail = trail.extend(step);
            self.walk_query_element(&child, &child_trail, depth + 1, directives)?;
        }
        Ok(())
    }
}

/// Compile a model into its topology map
pub fn compile_model_topology(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    model: &ModelDef,
) -> Result<TopologyMap> {
    if let Some(node_type) = model.widget_node_type() {
        return Ok(TopologyMap::new(TrailStep::new(node_type)));
    }

    let root = model_step(store, ctx, model, 0)?;
    let top = model.top_element(store)?;

    let mut compiler = TopologyCompiler::new(store, ctx, root, Purpose::Topology);
    let trail = compiler.map.root_trail();
    compiler.walk_element(&top, &trail, &ConstraintScope::new(), 0)?;
    debug!(
        "Compiled model {} {}: {} trails",
        model.model_id,
        model.model_version,
        compiler.map.len()
    );
    Ok(compiler.map)
}

/// Compile a named query into its topology map and element directives
pub fn compile_named_query_topology(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    query: &NamedQueryDef,
) -> Result<NamedQueryTopology> {
    let top = query.top_element(store)?;
    let root = model_step(store, ctx, &top.model(store)?, 0)?;

    let mut compiler = TopologyCompiler::new(store, ctx, root, Purpose::Topology);
    let trail = compiler.map.root_trail();
    let mut directives = HashMap::new();
    compiler.walk_query_element(&top, &trail, 0, &mut directives)?;
    debug!(
        "Compiled named query {}: {} trails, {} directives",
        query.uuid,
        compiler.map.len(),
        directives.len()
    );
    Ok(NamedQueryTopology {
        map: compiler.map,
        directives,
    })
}

/// Compute per-trail delete flags from a top model element.
///
/// When both overrides are given they become the root step's persona.
pub(crate) fn compile_delete_flags(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    top_element: &ModelElementDef,
    override_model_id: Option<&str>,
    override_model_version: Option<&str>,
) -> Result<DeleteFlags> {
    let mut root = model_step(store, ctx, &top_element.model(store)?, 0)?;
    if let (Some(id), Some(version)) = (override_model_id, override_model_version) {
        if ctx.catalog.supports_persona(&root.node_type) {
            root = TrailStep::new(root.node_type).with_persona(Persona::new(id, version));
        }
    }

    let mut compiler = TopologyCompiler::new(store, ctx, root, Purpose::DeleteFlags);
    let trail = compiler.map.root_trail();
    compiler.walk_element(top_element, &trail, &ConstraintScope::new(), 0)?;
    Ok(compiler.flags)
}
