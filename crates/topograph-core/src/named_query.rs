//! Named-query evaluation

use crate::compiler::{compile_named_query_topology, ElementDirectives, NamedQueryTopology};
use crate::config::EngineContext;
use crate::definition::find_named_query;
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::result::ResultTree;
use crate::traversal::{Collector, Visit, VisitHook};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Keep only result trees containing a matching node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryFilter {
    pub node_type: String,
    pub property_name: String,
    pub property_value: String,
}

/// A named query invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedQueryRequest {
    /// Query uuid or name
    pub query: String,

    /// Exact-match filters locating the start vertices
    #[serde(default)]
    pub start_filters: Vec<(String, String)>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_filter: Option<SecondaryFilter>,
}

impl NamedQueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.start_filters.push((name.into(), value.into()));
        self
    }

    pub fn with_secondary_filter(
        mut self,
        node_type: impl Into<String>,
        property_name: impl Into<String>,
        property_value: impl Into<String>,
    ) -> Self {
        self.secondary_filter = Some(SecondaryFilter {
            node_type: node_type.into(),
            property_name: property_name.into(),
            property_value: property_value.into(),
        });
        self
    }
}

struct NamedQueryVisit<'q> {
    directives: &'q HashMap<String, ElementDirectives>,
}

impl NamedQueryVisit<'_> {
    fn apply_related_lookups(
        store: &dyn GraphStore,
        directives: &ElementDirectives,
        node: &mut ResultTree,
    ) -> Result<()> {
        for lookup in &directives.related_lookups {
            if lookup.source_node_type != node.vertex.node_type {
                continue;
            }
            let value = match node.vertex.property_str(&lookup.source_node_property) {
                Some(value) => value.to_string(),
                None => continue,
            };
            let related = store.find_vertices(
                &lookup.target_node_type,
                &[(lookup.target_node_property.as_str(), value.as_str())],
            )?;
            let Some(target) = related.first() else {
                debug!(
                    "No {} with {}={} for {}",
                    lookup.target_node_type,
                    lookup.target_node_property,
                    value,
                    node.vertex.describe()
                );
                continue;
            };
            for name in &lookup.property_collect_list {
                if let Some(prop) = target.property(name) {
                    node.extra_properties
                        .insert(format!("{}.{}", lookup.target_node_type, name), prop.clone());
                }
            }
        }
        Ok(())
    }
}

impl VisitHook for NamedQueryVisit<'_> {
    fn visit(&mut self, store: &dyn GraphStore, node: &mut ResultTree) -> Result<Visit> {
        let Some(directives) = self.directives.get(&node.trail) else {
            return Ok(Visit::Expand);
        };
        let element = &directives.element;
        node.do_not_output = element.do_not_output;
        node.property_limit = element.property_limit;
        for name in &element.property_collect_list {
            if let Some(prop) = node.vertex.property(name) {
                node.property_overrides.insert(name.clone(), prop.clone());
            }
        }
        Self::apply_related_lookups(store, directives, node)?;

        if let Some(failed) = directives
            .constraints
            .iter()
            .find(|c| !c.is_satisfied_by(&node.vertex))
        {
            debug!(
                "{} fails constraint on {}, dropping it",
                node.vertex.describe(),
                failed.property_name
            );
            return Ok(Visit::Drop);
        }
        Ok(Visit::Expand)
    }
}

/// Run a compiled named query from each start vertex
pub fn evaluate_compiled(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    compiled: &NamedQueryTopology,
    request: &NamedQueryRequest,
) -> Result<Vec<ResultTree>> {
    let root = compiled.map.root_step();
    let filters: Vec<(&str, &str)> = request
        .start_filters
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let starts: Vec<_> = store
        .find_vertices(&root.node_type, &filters)?
        .into_iter()
        .filter(|v| root.matches_vertex(v))
        .collect();
    if starts.is_empty() {
        return Err(Error::NoStartVertex(root.render()));
    }

    let hook = NamedQueryVisit {
        directives: &compiled.directives,
    };
    let mut collector = Collector::new(store, ctx, &compiled.map, hook);
    let mut trees = Vec::with_capacity(starts.len());
    for start in starts {
        trees.extend(collector.collect_from(start)?);
    }
    let mut results = ResultTree::collapse_all(trees);

    if let Some(filter) = &request.secondary_filter {
        results.retain(|tree| {
            tree.any_node_matches(&filter.node_type, &filter.property_name, &filter.property_value)
        });
    }
    debug!(
        "Named query {} produced {} results ({} nodes visited)",
        request.query,
        results.len(),
        collector.count()
    );
    Ok(results)
}

/// Compile and run a named query
pub fn evaluate_named_query(
    store: &dyn GraphStore,
    ctx: &EngineContext,
    request: &NamedQueryRequest,
) -> Result<Vec<ResultTree>> {
    let query = find_named_query(store, &request.query)?;
    let compiled = compile_named_query_topology(store, ctx, &query)?;
    evaluate_compiled(store, ctx, &compiled, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{context, widget};
    use crate::definition::{labels, node_types, props};
    use crate::error::ErrorKind;
    use crate::graph::Graph;
    use crate::vertex::Vertex;

    /// vserver (hidden) → l-interface, interfaces constrained to ACTIVE
    fn query_graph(graph: &mut Graph) {
        let vs = widget(graph, "vserver");
        let li = widget(graph, "l-interface");
        let vlan = widget(graph, "vlan");
        graph.add_vertex(
            Vertex::new("nq", node_types::NAMED_QUERY)
                .with_property(props::NAMED_QUERY_UUID, "nq-1")
                .with_property(props::NAMED_QUERY_NAME, "active-interfaces"),
        );
        graph.add_vertex(
            Vertex::new("nqe-vs", node_types::NAMED_QUERY_ELEMENT)
                .with_property(props::DO_NOT_OUTPUT, "T"),
        );
        graph.add_vertex(
            Vertex::new("nqe-li", node_types::NAMED_QUERY_ELEMENT)
                .with_property(props::PROPERTY_COLLECT_LIST, vec!["interface-name"]),
        );
        graph.add_vertex(Vertex::new("nqe-vlan", node_types::NAMED_QUERY_ELEMENT));
        graph.add_vertex(
            Vertex::new("pc", node_types::PROPERTY_CONSTRAINT)
                .with_property(props::CONSTRAINT_TYPE, "EQUALS")
                .with_property(props::PROPERTY_NAME, "prov-status")
                .with_property(props::PROPERTY_VALUE, "ACTIVE"),
        );
        graph.add_vertex(
            Vertex::new("rl", node_types::RELATED_LOOKUP)
                .with_property(props::SOURCE_NODE_TYPE, "l-interface")
                .with_property(props::SOURCE_NODE_PROPERTY, "network-name")
                .with_property(props::TARGET_NODE_TYPE, "l3-network")
                .with_property(props::TARGET_NODE_PROPERTY, "network-name")
                .with_property(props::PROPERTY_COLLECT_LIST, vec!["network-role"]),
        );
        graph.connect("nq", "nqe-vs", labels::STARTS_WITH).unwrap();
        graph.connect("nqe-vs", &vs, labels::IS_A).unwrap();
        graph.connect("nqe-li", &li, labels::IS_A).unwrap();
        graph.connect("nqe-vlan", &vlan, labels::IS_A).unwrap();
        graph.connect("nqe-vs", "nqe-li", labels::CONNECTS_TO).unwrap();
        graph.connect("nqe-li", "nqe-vlan", labels::CONNECTS_TO).unwrap();
        graph.connect("nqe-li", "pc", labels::USES).unwrap();
        graph.connect("nqe-li", "rl", labels::USES).unwrap();

        graph.add_vertex(Vertex::new("v1", "vserver").with_property("vserver-name", "web"));
        graph.add_vertex(
            Vertex::new("i1", "l-interface")
                .with_property("interface-name", "eth0")
                .with_property("prov-status", "ACTIVE")
                .with_property("network-name", "oam"),
        );
        graph.add_vertex(
            Vertex::new("i2", "l-interface")
                .with_property("interface-name", "eth1")
                .with_property("prov-status", "PLANNED"),
        );
        graph.add_vertex(Vertex::new("x1", "vlan"));
        graph.add_vertex(Vertex::new("x2", "vlan"));
        graph.add_vertex(
            Vertex::new("n1", "l3-network")
                .with_property("network-name", "oam")
                .with_property("network-role", "management"),
        );
        graph.connect("v1", "i1", "has").unwrap();
        graph.connect("v1", "i2", "has").unwrap();
        graph.connect("i1", "x1", "has").unwrap();
        graph.connect("i2", "x2", "has").unwrap();
    }

    #[test]
    fn test_hidden_root_fans_out() {
        let mut graph = Graph::new();
        query_graph(&mut graph);
        let ctx = context();

        let request = NamedQueryRequest::new("active-interfaces").with_filter("vserver-name", "web");
        let results = evaluate_named_query(&graph, &ctx, &request).unwrap();

        let ids: Vec<&str> = results.iter().map(|t| t.id().as_str()).collect();
        assert_eq!(ids, vec!["i1"]);
    }

    #[test]
    fn test_failed_constraint_drops_instance() {
        let mut graph = Graph::new();
        query_graph(&mut graph);
        let ctx = context();

        let results =
            evaluate_named_query(&graph, &ctx, &NamedQueryRequest::new("nq-1")).unwrap();
        assert_eq!(results.len(), 1);
        let active = &results[0];
        assert_eq!(active.children.len(), 1);
        assert_eq!(active.children[0].id().as_str(), "x1");

        let ids: Vec<&str> = results
            .iter()
            .flat_map(|t| t.vertex_ids())
            .map(|id| id.as_str())
            .collect();
        assert!(!ids.contains(&"i2"));
        assert!(!ids.contains(&"x2"));
    }

    #[test]
    fn test_overrides_and_related_lookup() {
        let mut graph = Graph::new();
        query_graph(&mut graph);
        let ctx = context();

        let results =
            evaluate_named_query(&graph, &ctx, &NamedQueryRequest::new("nq-1")).unwrap();
        let i1 = &results[0];
        assert_eq!(i1.property_overrides.len(), 1);
        assert!(i1.property_overrides.contains_key("interface-name"));
        assert_eq!(
            i1.extra_properties
                .get("l3-network.network-role")
                .and_then(|v| v.as_str()),
            Some("management")
        );
    }

    #[test]
    fn test_secondary_filter() {
        let mut graph = Graph::new();
        query_graph(&mut graph);
        let ctx = context();

        let request =
            NamedQueryRequest::new("nq-1").with_secondary_filter("l-interface", "interface-name", "eth0");
        let results = evaluate_named_query(&graph, &ctx, &request).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id().as_str(), "i1");

        // eth1 failed its constraint, so nothing is left to match
        let request =
            NamedQueryRequest::new("nq-1").with_secondary_filter("l-interface", "interface-name", "eth1");
        let results = evaluate_named_query(&graph, &ctx, &request).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_no_start_vertex() {
        let mut graph = Graph::new();
        query_graph(&mut graph);
        let ctx = context();

        let request = NamedQueryRequest::new("nq-1").with_filter("vserver-name", "db");
        let err = evaluate_named_query(&graph, &ctx, &request).unwrap_err();
        assert!(matches!(err, Error::NoStartVertex(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unknown_query() {
        let graph = Graph::new();
        let ctx = context();
        let err = evaluate_named_query(&graph, &ctx, &NamedQueryRequest::new("missing")).unwrap_err();
        assert!(matches!(err, Error::NamedQueryNotFound(_)));
    }
}
