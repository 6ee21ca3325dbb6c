//! Tag-guided search
//!
//! Edges may carry boolean tag properties. A walk in a direction follows
//! edges tagged `<tag>` that way and edges tagged `<tag>-REV` the opposite
//! way, so a single tag describes one logical direction over edges stored
//! either way round.

use crate::error::{SearchError, SearchResult};
use crate::filter::{find_start_vertices, StartFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use topograph_core::{Direction, EdgeFilter, GraphStore, ResultTree, Trail, TrailStep, Vertex, VertexId};
use tracing::{debug, error};

/// Vertices one tagged hop away from `id`, each listed once
pub fn tagged_neighbours(
    store: &dyn GraphStore,
    id: &str,
    tag: &str,
    direction: Direction,
) -> SearchResult<Vec<Vertex>> {
    let forward = store.adjacent(id, direction, &EdgeFilter::Tag(tag.to_string()))?;
    let reverse = store.adjacent(id, direction.opposite(), &EdgeFilter::reverse_tag(tag))?;

    let mut seen = HashSet::new();
    Ok(forward
        .into_iter()
        .chain(reverse)
        .filter(|v| seen.insert(v.id.clone()))
        .collect())
}

/// Vertices of `top_node_type` reachable from the filter's start vertices
/// over `edge_tag` edges, sorted by id
pub fn find_top_nodes(
    store: &dyn GraphStore,
    filter: &StartFilter,
    top_node_type: &str,
    edge_tag: &str,
    direction: Direction,
    max_levels: u32,
) -> SearchResult<Vec<Vertex>> {
    let starts = find_start_vertices(store, filter)?;
    let mut found = BTreeMap::new();
    for start in &starts {
        let mut visited = HashSet::new();
        climb(
            store,
            start,
            top_node_type,
            edge_tag,
            direction,
            max_levels,
            0,
            &mut visited,
            &mut found,
        )?;
    }
    debug!(
        "Found {} {} vertices from {} start vertices",
        found.len(),
        top_node_type,
        starts.len()
    );
    Ok(found.into_values().collect())
}

#[allow(clippy::too_many_arguments)]
fn climb(
    store: &dyn GraphStore,
    vertex: &Vertex,
    top_node_type: &str,
    edge_tag: &str,
    direction: Direction,
    max_levels: u32,
    level: u32,
    visited: &mut HashSet<VertexId>,
    found: &mut BTreeMap<VertexId, Vertex>,
) -> SearchResult<()> {
    if level > max_levels {
        error!("Tag search from {} passed {} levels", vertex.describe(), max_levels);
        return Err(SearchError::MaxLevelsExceeded { max: max_levels });
    }
    if !visited.insert(vertex.id.clone()) {
        return Ok(());
    }
    if vertex.node_type == top_node_type {
        found.insert(vertex.id.clone(), vertex.clone());
        return Ok(());
    }
    for next in tagged_neighbours(store, vertex.id.as_str(), edge_tag, direction)? {
        climb(
            store,
            &next,
            top_node_type,
            edge_tag,
            direction,
            max_levels,
            level + 1,
            visited,
            found,
        )?;
    }
    Ok(())
}

/// Stop descending past `node_type` except below the instance `keep_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneRule {
    pub node_type: String,
    pub keep_id: String,
}

/// Options for [`collect_tagged`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectOptions {
    pub edge_tag: String,
    #[serde(default)]
    pub direction: Direction,
    pub max_levels: u32,
    /// Node types left out of the result entirely
    #[serde(default)]
    pub trim: Vec<String>,
    #[serde(default)]
    pub prune: Option<PruneRule>,
}

impl CollectOptions {
    pub fn new(edge_tag: impl Into<String>, max_levels: u32) -> Self {
        Self {
            edge_tag: edge_tag.into(),
            direction: Direction::Outgoing,
            max_levels,
            trim: Vec::new(),
            prune: None,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_trim(mut self, node_type: impl Into<String>) -> Self {
        self.trim.push(node_type.into());
        self
    }

    pub fn with_prune(mut self, node_type: impl Into<String>, keep_id: impl Into<String>) -> Self {
        self.prune = Some(PruneRule {
            node_type: node_type.into(),
            keep_id: keep_id.into(),
        });
        self
    }

    fn trimmed(&self, vertex: &Vertex) -> bool {
        self.trim.iter().any(|t| *t == vertex.node_type)
    }

    fn pruned(&self, vertex: &Vertex) -> bool {
        self.prune
            .as_ref()
            .is_some_and(|p| p.node_type == vertex.node_type && p.keep_id != vertex.id.as_str())
    }
}

/// Everything reachable from `top` over the option's tag, as a tree
pub fn collect_tagged(
    store: &dyn GraphStore,
    top: &Vertex,
    options: &CollectOptions,
) -> SearchResult<ResultTree> {
    let mut visited = HashSet::new();
    let trail = Trail::root(TrailStep::new(top.node_type.clone()));
    let tree = gather(store, top.clone(), &trail, options, 0, &mut visited)?;
    debug!("Collected {} vertices under {}", tree.node_count(), top.describe());
    Ok(tree)
}

fn gather(
    store: &dyn GraphStore,
    vertex: Vertex,
    trail: &Trail,
    options: &CollectOptions,
    level: u32,
    visited: &mut HashSet<VertexId>,
) -> SearchResult<ResultTree> {
    if level > options.max_levels {
        error!("Tagged collect passed {} levels at {}", options.max_levels, vertex.describe());
        return Err(SearchError::MaxLevelsExceeded {
            max: options.max_levels,
        });
    }
    visited.insert(vertex.id.clone());

    let stop = options.pruned(&vertex);
    let mut node = ResultTree::new(vertex, trail.key());
    if stop {
        return Ok(node);
    }

    let neighbours = tagged_neighbours(store, node.id().as_str(), &options.edge_tag, options.direction)?;
    for next in neighbours {
        if visited.contains(&next.id) || options.trimmed(&next) {
            continue;
        }
        let child_trail = trail.extend(TrailStep::new(next.node_type.clone()));
        let child = gather(store, next, &child_trail, options, level + 1, visited)?;
        node.children.push(child);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topograph_core::{Edge, Graph};

    fn tagged(out_id: &str, in_id: &str, tag: &str) -> Edge {
        Edge::new(out_id, in_id, "link").with_tag(tag)
    }

    // p1 -> v1 -> t1 and p1 -> v2, with s1 -> v2 tagged in reverse
    fn create_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("p1", "pserver").with_property("hostname", "HOST1"));
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("v2", "vserver"));
        graph.add_vertex(Vertex::new("t1", "tenant"));
        graph.add_vertex(Vertex::new("s1", "service-instance"));
        graph.add_edge(tagged("p1", "v1", "up")).unwrap();
        graph.add_edge(tagged("p1", "v2", "up")).unwrap();
        graph.add_edge(tagged("v1", "t1", "up")).unwrap();
        graph.add_edge(tagged("s1", "v2", "up-REV")).unwrap();
        graph
    }

    #[test]
    fn test_tagged_neighbours_follow_reverse_tag() {
        let graph = create_graph();
        let up: Vec<String> = tagged_neighbours(&graph, "v2", "up", Direction::Outgoing)
            .unwrap()
            .into_iter()
            .map(|v| v.id.to_string())
            .collect();
        assert_eq!(up, vec!["s1"]);
    }

    #[test]
    fn test_find_top_nodes_from_case_shifted_host() {
        let graph = create_graph();
        let filter = StartFilter::new("pserver").with_property("hostname", "host1");

        let tops = find_top_nodes(&graph, &filter, "tenant", "up", Direction::Outgoing, 5).unwrap();
        assert_eq!(tops.len(), 1);
        assert_eq!(tops[0].id.as_str(), "t1");

        let services =
            find_top_nodes(&graph, &filter, "service-instance", "up", Direction::Outgoing, 5).unwrap();
        assert_eq!(services[0].id.as_str(), "s1");
    }

    #[test]
    fn test_find_top_nodes_level_limit() {
        let graph = create_graph();
        let filter = StartFilter::new("pserver").with_property("hostname", "HOST1");
        let err = find_top_nodes(&graph, &filter, "tenant", "up", Direction::Outgoing, 1).unwrap_err();
        assert!(matches!(err, SearchError::MaxLevelsExceeded { max: 1 }));
    }

    #[test]
    fn test_collect_tagged_trim_and_prune() {
        let graph = create_graph();
        let p1 = graph.get_vertex("p1").unwrap();

        let all = collect_tagged(&graph, &p1, &CollectOptions::new("up", 5)).unwrap();
        assert_eq!(all.node_count(), 5);

        let trimmed = collect_tagged(&graph, &p1, &CollectOptions::new("up", 5).with_trim("tenant")).unwrap();
        assert_eq!(trimmed.node_count(), 4);
        assert!(trimmed.vertex_ids().iter().all(|id| id.as_str() != "t1"));

        // v2 is not the kept instance, so s1 below it is left out
        let pruned =
            collect_tagged(&graph, &p1, &CollectOptions::new("up", 5).with_prune("vserver", "v1")).unwrap();
        let ids: Vec<&str> = pruned.vertex_ids().into_iter().map(|id| id.as_str()).collect();
        assert!(ids.contains(&"t1"));
        assert!(ids.contains(&"v2"));
        assert!(!ids.contains(&"s1"));
    }

    #[test]
    fn test_collect_tagged_trail_keys() {
        let graph = create_graph();
        let p1 = graph.get_vertex("p1").unwrap();
        let tree = collect_tagged(&graph, &p1, &CollectOptions::new("up", 5)).unwrap();
        assert_eq!(tree.trail, "pserver");
        assert!(tree.children.iter().all(|c| c.trail.starts_with("pserver")));
    }
}
