//! Model and named-query definitions, read from the graph itself
//!
//! Definitions are ordinary vertices joined by a small set of labelled
//! edges:
//!
//! ```text
//! model -startsWith-> model-element -isA-> model
//! model-element -connectsTo-> model-element | constrained-element-set
//! model-element -uses-> model-constraint -uses-> constrained-element-set
//! constrained-element-set -uses-> element-choice-set -has-> model-element
//! named-query -startsWith-> named-query-element -isA-> model
//! named-query-element -connectsTo-> named-query-element
//! named-query-element -uses-> property-constraint | related-lookup
//! ```

use crate::edge::{Direction, EdgeFilter};
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::result::PropertyLimit;
use crate::trail::Persona;
use crate::vertex::{Vertex, VertexId};
use std::collections::HashMap;

pub mod node_types {
    pub const MODEL: &str = "model";
    pub const MODEL_ELEMENT: &str = "model-element";
    pub const MODEL_CONSTRAINT: &str = "model-constraint";
    pub const CONSTRAINED_ELEMENT_SET: &str = "constrained-element-set";
    pub const ELEMENT_CHOICE_SET: &str = "element-choice-set";
    pub const NAMED_QUERY: &str = "named-query";
    pub const NAMED_QUERY_ELEMENT: &str = "named-query-element";
    pub const PROPERTY_CONSTRAINT: &str = "property-constraint";
    pub const RELATED_LOOKUP: &str = "related-lookup";
}

pub mod labels {
    pub const STARTS_WITH: &str = "startsWith";
    pub const IS_A: &str = "isA";
    pub const CONNECTS_TO: &str = "connectsTo";
    pub const USES: &str = "uses";
    pub const HAS: &str = "has";
}

pub mod props {
    pub const MODEL_ID: &str = "model-id";
    pub const MODEL_VERSION: &str = "model-version";
    pub const MODEL_NAME: &str = "model-name";
    pub const MODEL_TYPE: &str = "model-type";
    pub const MODEL_ELEMENT_UUID: &str = "model-element-uuid";
    pub const NEW_DATA_DEL_FLAG: &str = "new-data-del-flag";
    pub const LINKAGE_POINTS: &str = "linkage-points";
    pub const CONSTRAINED_ELEMENT_SET_UUID: &str = "constrained-element-set-uuid";
    pub const CONSTRAINED_ELEMENT_SET_UUID_TO_REPLACE: &str =
        "constrained-element-set-uuid-to-replace";
    pub const NAMED_QUERY_UUID: &str = "named-query-uuid";
    pub const NAMED_QUERY_NAME: &str = "named-query-name";
    pub const DO_NOT_OUTPUT: &str = "do-not-output";
    pub const PROPERTY_COLLECT_LIST: &str = "property-collect-list";
    pub const PROPERTY_LIMIT_DESC: &str = "property-limit-desc";
    pub const CONSTRAINT_TYPE: &str = "constraint-type";
    pub const PROPERTY_NAME: &str = "property-name";
    pub const PROPERTY_VALUE: &str = "property-value";
    pub const SOURCE_NODE_TYPE: &str = "source-node-type";
    pub const SOURCE_NODE_PROPERTY: &str = "source-node-property";
    pub const TARGET_NODE_TYPE: &str = "target-node-type";
    pub const TARGET_NODE_PROPERTY: &str = "target-node-property";
}

fn targets(store: &dyn GraphStore, id: &VertexId, label: &str) -> Result<Vec<Vertex>> {
    store.adjacent(
        id.as_str(),
        Direction::Outgoing,
        &EdgeFilter::Label(label.to_string()),
    )
}

fn single_target(
    store: &dyn GraphStore,
    id: &VertexId,
    label: &str,
    invalid: impl Fn(String) -> Error,
) -> Result<Vertex> {
    let mut found = targets(store, id, label)?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(invalid(format!("{} has no {} edge", id, label))),
        n => Err(invalid(format!("{} has {} {} edges, expected one", id, n, label))),
    }
}

fn expect_type(vertex: &Vertex, node_type: &str, invalid: impl Fn(String) -> Error) -> Result<()> {
    if vertex.node_type != node_type {
        return Err(invalid(format!(
            "{} is a {}, expected {}",
            vertex.id, vertex.node_type, node_type
        )));
    }
    Ok(())
}

fn required_str(vertex: &Vertex, name: &str, invalid: impl Fn(String) -> Error) -> Result<String> {
    vertex
        .property_str(name)
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("{} {} lacks {}", vertex.node_type, vertex.id, name)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Models
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Maps one-to-one onto a graph node type
    Widget,
    Resource,
    Service,
}

impl ModelKind {
    /// Resource and service models are composed of other models
    pub fn is_composite(self) -> bool {
        !matches!(self, Self::Widget)
    }
}

impl std::str::FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "widget" => Ok(Self::Widget),
            "resource" => Ok(Self::Resource),
            "service" => Ok(Self::Service),
            other => Err(Error::InvalidModel(format!("unknown model-type: {}", other))),
        }
    }
}

/// A model vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub vertex_id: VertexId,
    pub model_id: String,
    pub model_version: String,
    pub model_name: Option<String>,
    pub kind: ModelKind,
}

impl ModelDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::MODEL, Error::InvalidModel)?;
        let kind: ModelKind = required_str(vertex, props::MODEL_TYPE, Error::InvalidModel)?.parse()?;
        let model_name = vertex.property_str(props::MODEL_NAME).map(str::to_string);
        if kind == ModelKind::Widget && model_name.is_none() {
            return Err(Error::InvalidModel(format!(
                "widget model {} lacks {}",
                vertex.id,
                props::MODEL_NAME
            )));
        }
        Ok(Self {
            vertex_id: vertex.id.clone(),
            model_id: required_str(vertex, props::MODEL_ID, Error::InvalidModel)?,
            model_version: required_str(vertex, props::MODEL_VERSION, Error::InvalidModel)?,
            model_name,
            kind,
        })
    }

    pub fn persona(&self) -> Persona {
        Persona::new(&self.model_id, &self.model_version)
    }

    /// The node type a widget model stands for
    pub fn widget_node_type(&self) -> Option<&str> {
        match self.kind {
            ModelKind::Widget => self.model_name.as_deref(),
            _ => None,
        }
    }

    /// First element of a resource/service model's topology
    pub fn top_element(&self, store: &dyn GraphStore) -> Result<ModelElementDef> {
        let vertex = single_target(store, &self.vertex_id, labels::STARTS_WITH, Error::InvalidModel)?;
        ModelElementDef::from_vertex(&vertex)
    }
}

/// Look up a model by id and version
pub fn find_model(store: &dyn GraphStore, model_id: &str, model_version: &str) -> Result<ModelDef> {
    let found = store.find_vertices(
        node_types::MODEL,
        &[(props::MODEL_ID, model_id), (props::MODEL_VERSION, model_version)],
    )?;
    match found.as_slice() {
        [vertex] => ModelDef::from_vertex(vertex),
        [] => Err(Error::ModelNotFound {
            model_id: model_id.to_string(),
            model_version: model_version.to_string(),
        }),
        _ => Err(Error::InvalidModel(format!(
            "model {} version {} is defined {} times",
            model_id,
            model_version,
            found.len()
        ))),
    }
}

/// Pipe-delimited node-type path attaching an element to another topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkagePath {
    pub steps: Vec<String>,
}

impl std::str::FromStr for LinkagePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let steps: Vec<String> = s
            .split('|')
            .map(str::trim)
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();
        if steps.is_empty() {
            return Err(Error::InvalidModel(format!("empty linkage point: {:?}", s)));
        }
        Ok(Self { steps })
    }
}

/// A model element vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelElementDef {
    pub vertex_id: VertexId,
    pub uuid: Option<String>,
    pub new_data_del_flag: bool,
    pub linkage_points: Vec<LinkagePath>,
}

impl ModelElementDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::MODEL_ELEMENT, Error::InvalidModel)?;
        let linkage_points = vertex
            .list(props::LINKAGE_POINTS)
            .iter()
            .map(|lp| lp.parse())
            .collect::<Result<Vec<LinkagePath>>>()?;
        Ok(Self {
            vertex_id: vertex.id.clone(),
            uuid: vertex.property_str(props::MODEL_ELEMENT_UUID).map(str::to_string),
            new_data_del_flag: vertex.flag(props::NEW_DATA_DEL_FLAG),
            linkage_points,
        })
    }

    /// The model this element is an instance of
    pub fn model(&self, store: &dyn GraphStore) -> Result<ModelDef> {
        let vertex = single_target(store, &self.vertex_id, labels::IS_A, Error::InvalidModel)?;
        ModelDef::from_vertex(&vertex)
    }

    /// Outgoing `connectsTo` targets
    pub fn connections(&self, store: &dyn GraphStore) -> Result<Vec<DefinitionNode>> {
        targets(store, &self.vertex_id, labels::CONNECTS_TO)?
            .iter()
            .map(DefinitionNode::from_vertex)
            .collect()
    }

    /// Model constraints attached to this element
    pub fn constraints(&self, store: &dyn GraphStore) -> Result<Vec<ModelConstraintDef>> {
        targets(store, &self.vertex_id, labels::USES)?
            .iter()
            .filter(|v| v.node_type == node_types::MODEL_CONSTRAINT)
            .map(|v| ModelConstraintDef::from_vertex(store, v))
            .collect()
    }
}

/// Override of one constrained element set for a sub-topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConstraintDef {
    pub uuid_to_replace: String,
    pub replacement: ConstrainedElementSetDef,
}

impl ModelConstraintDef {
    pub fn from_vertex(store: &dyn GraphStore, vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::MODEL_CONSTRAINT, Error::InvalidModel)?;
        let uuid_to_replace = required_str(
            vertex,
            props::CONSTRAINED_ELEMENT_SET_UUID_TO_REPLACE,
            Error::InvalidModel,
        )?;
        let target = single_target(store, &vertex.id, labels::USES, Error::InvalidModel)?;
        Ok(Self {
            uuid_to_replace,
            replacement: ConstrainedElementSetDef::from_vertex(&target)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstrainedElementSetDef {
    pub vertex_id: VertexId,
    pub uuid: String,
}

impl ConstrainedElementSetDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::CONSTRAINED_ELEMENT_SET, Error::InvalidModel)?;
        Ok(Self {
            vertex_id: vertex.id.clone(),
            uuid: required_str(vertex, props::CONSTRAINED_ELEMENT_SET_UUID, Error::InvalidModel)?,
        })
    }

    pub fn choice_sets(&self, store: &dyn GraphStore) -> Result<Vec<ElementChoiceSetDef>> {
        targets(store, &self.vertex_id, labels::USES)?
            .iter()
            .map(ElementChoiceSetDef::from_vertex)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementChoiceSetDef {
    pub vertex_id: VertexId,
}

impl ElementChoiceSetDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::ELEMENT_CHOICE_SET, Error::InvalidModel)?;
        Ok(Self {
            vertex_id: vertex.id.clone(),
        })
    }

    pub fn members(&self, store: &dyn GraphStore) -> Result<Vec<ModelElementDef>> {
        targets(store, &self.vertex_id, labels::HAS)?
            .iter()
            .map(ModelElementDef::from_vertex)
            .collect()
    }
}

/// Constrained-element-set replacements in force for a sub-walk.
///
/// The first constraint seen for a uuid wins, so an outer model can pin a
/// choice that an inner model would otherwise override.
#[derive(Debug, Clone, Default)]
pub struct ConstraintScope {
    replacements: HashMap<String, ConstrainedElementSetDef>,
}

impl ConstraintScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope extended with an element's own constraints
    pub fn with_constraints(&self, constraints: Vec<ModelConstraintDef>) -> Self {
        let mut scope = self.clone();
        for constraint in constraints {
            scope
                .replacements
                .entry(constraint.uuid_to_replace)
                .or_insert(constraint.replacement);
        }
        scope
    }

    pub fn replacement_for(&self, uuid: &str) -> Option<&ConstrainedElementSetDef> {
        self.replacements.get(uuid)
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

/// The closed set of vertices a `connectsTo` edge may point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionNode {
    ModelElement(ModelElementDef),
    ConstrainedElementSet(ConstrainedElementSetDef),
    ElementChoiceSet(ElementChoiceSetDef),
}

impl DefinitionNode {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        match vertex.node_type.as_str() {
            node_types::MODEL_ELEMENT => Ok(Self::ModelElement(ModelElementDef::from_vertex(vertex)?)),
            node_types::CONSTRAINED_ELEMENT_SET => Ok(Self::ConstrainedElementSet(
                ConstrainedElementSetDef::from_vertex(vertex)?,
            )),
            node_types::ELEMENT_CHOICE_SET => {
                Ok(Self::ElementChoiceSet(ElementChoiceSetDef::from_vertex(vertex)?))
            }
            other => Err(Error::InvalidModel(format!(
                "{} cannot appear in a model topology ({})",
                other, vertex.id
            ))),
        }
    }

    /// Expand to the model elements this node stands for, applying any
    /// constrained-element-set replacement in scope
    pub fn resolve(&self, store: &dyn GraphStore, scope: &ConstraintScope) -> Result<Vec<ModelElementDef>> {
        match self {
            Self::ModelElement(element) => Ok(vec![element.clone()]),
            Self::ConstrainedElementSet(set) => {
                let effective = match scope.replacement_for(&set.uuid) {
                    Some(replacement) => {
                        tracing::debug!(
                            "Constraint replaces element set {} with {}",
                            set.uuid,
                            replacement.uuid
                        );
                        replacement
                    }
                    None => set,
                };
                let mut elements = Vec::new();
                for choice in effective.choice_sets(store)? {
                    elements.extend(Self::ElementChoiceSet(choice).resolve(store, scope)?);
                }
                Ok(elements)
            }
            Self::ElementChoiceSet(choice) => choice.members(store),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Named queries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQueryDef {
    pub vertex_id: VertexId,
    pub uuid: String,
    pub name: Option<String>,
}

impl NamedQueryDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::NAMED_QUERY, Error::InvalidNamedQuery)?;
        Ok(Self {
            vertex_id: vertex.id.clone(),
            uuid: required_str(vertex, props::NAMED_QUERY_UUID, Error::InvalidNamedQuery)?,
            name: vertex.property_str(props::NAMED_QUERY_NAME).map(str::to_string),
        })
    }

    pub fn top_element(&self, store: &dyn GraphStore) -> Result<NamedQueryElementDef> {
        let vertex = single_target(
            store,
            &self.vertex_id,
            labels::STARTS_WITH,
            Error::InvalidNamedQuery,
        )?;
        NamedQueryElementDef::from_vertex(&vertex)
    }
}

/// Look up a named query by uuid, falling back to its name
pub fn find_named_query(store: &dyn GraphStore, uuid_or_name: &str) -> Result<NamedQueryDef> {
    for prop in [props::NAMED_QUERY_UUID, props::NAMED_QUERY_NAME] {
        let found = store.find_vertices(node_types::NAMED_QUERY, &[(prop, uuid_or_name)])?;
        match found.as_slice() {
            [vertex] => return NamedQueryDef::from_vertex(vertex),
            [] => continue,
            _ => {
                return Err(Error::InvalidNamedQuery(format!(
                    "{} matches {} named queries",
                    uuid_or_name,
                    found.len()
                )))
            }
        }
    }
    Err(Error::NamedQueryNotFound(uuid_or_name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    Equals,
    NotEquals,
}

impl std::str::FromStr for ConstraintType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "EQUALS" => Ok(Self::Equals),
            "NOT-EQUALS" => Ok(Self::NotEquals),
            other => Err(Error::InvalidNamedQuery(format!(
                "unknown constraint-type: {}",
                other
            ))),
        }
    }
}

/// Equality test an instance must pass before the walk descends from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyConstraint {
    pub constraint_type: ConstraintType,
    pub property_name: String,
    pub property_value: String,
}

impl PropertyConstraint {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::PROPERTY_CONSTRAINT, Error::InvalidNamedQuery)?;
        Ok(Self {
            constraint_type: required_str(vertex, props::CONSTRAINT_TYPE, Error::InvalidNamedQuery)?
                .parse()?,
            property_name: required_str(vertex, props::PROPERTY_NAME, Error::InvalidNamedQuery)?,
            property_value: required_str(vertex, props::PROPERTY_VALUE, Error::InvalidNamedQuery)?,
        })
    }

    pub fn is_satisfied_by(&self, vertex: &Vertex) -> bool {
        let equal = vertex
            .property(&self.property_name)
            .map(|p| p.matches(&self.property_value))
            .unwrap_or(false);
        match self.constraint_type {
            ConstraintType::Equals => equal,
            ConstraintType::NotEquals => !equal,
        }
    }
}

/// Join to an unconnected vertex by property equality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedLookup {
    pub source_node_type: String,
    pub source_node_property: String,
    pub target_node_type: String,
    pub target_node_property: String,
    pub property_collect_list: Vec<String>,
}

impl RelatedLookup {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::RELATED_LOOKUP, Error::InvalidNamedQuery)?;
        Ok(Self {
            source_node_type: required_str(vertex, props::SOURCE_NODE_TYPE, Error::InvalidNamedQuery)?,
            source_node_property: required_str(
                vertex,
                props::SOURCE_NODE_PROPERTY,
                Error::InvalidNamedQuery,
            )?,
            target_node_type: required_str(vertex, props::TARGET_NODE_TYPE, Error::InvalidNamedQuery)?,
            target_node_property: required_str(
                vertex,
                props::TARGET_NODE_PROPERTY,
                Error::InvalidNamedQuery,
            )?,
            property_collect_list: vertex.list(props::PROPERTY_COLLECT_LIST),
        })
    }
}

/// A named query element vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQueryElementDef {
    pub vertex_id: VertexId,
    pub do_not_output: bool,
    pub property_collect_list: Vec<String>,
    pub property_limit: Option<PropertyLimit>,
}

impl NamedQueryElementDef {
    pub fn from_vertex(vertex: &Vertex) -> Result<Self> {
        expect_type(vertex, node_types::NAMED_QUERY_ELEMENT, Error::InvalidNamedQuery)?;
        let property_limit = vertex
            .property_str(props::PROPERTY_LIMIT_DESC)
            .map(str::parse::<PropertyLimit>)
            .transpose()?;
        Ok(Self {
            vertex_id: vertex.id.clone(),
            do_not_output: vertex.flag(props::DO_NOT_OUTPUT),
            property_collect_list: vertex.list(props::PROPERTY_COLLECT_LIST),
            property_limit,
        })
    }

    pub fn model(&self, store: &dyn GraphStore) -> Result<ModelDef> {
        let vertex = single_target(store, &self.vertex_id, labels::IS_A, Error::InvalidNamedQuery)?;
        ModelDef::from_vertex(&vertex)
    }

    pub fn children(&self, store: &dyn GraphStore) -> Result<Vec<NamedQueryElementDef>> {
        targets(store, &self.vertex_id, labels::CONNECTS_TO)?
            .iter()
            .map(NamedQueryElementDef::from_vertex)
            .collect()
    }

    pub fn property_constraints(&self, store: &dyn GraphStore) -> Result<Vec<PropertyConstraint>> {
        targets(store, &self.vertex_id, labels::USES)?
            .iter()
            .filter(|v| v.node_type == node_types::PROPERTY_CONSTRAINT)
            .map(PropertyConstraint::from_vertex)
            .collect()
    }

    pub fn related_lookups(&self, store: &dyn GraphStore) -> Result<Vec<RelatedLookup>> {
        targets(store, &self.vertex_id, labels::USES)?
            .iter()
            .filter(|v| v.node_type == node_types::RELATED_LOOKUP)
            .map(RelatedLookup::from_vertex)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn model_vertex(id: &str, model_id: &str, kind: &str, name: &str) -> Vertex {
        Vertex::new(id, node_types::MODEL)
            .with_property(props::MODEL_ID, model_id)
            .with_property(props::MODEL_VERSION, "1.0")
            .with_property(props::MODEL_TYPE, kind)
            .with_property(props::MODEL_NAME, name)
    }

    #[test]
    fn test_find_model() {
        let mut graph = Graph::new();
        graph.add_vertex(model_vertex("m1", "vserver-widget", "widget", "vserver"));

        let model = find_model(&graph, "vserver-widget", "1.0").unwrap();
        assert_eq!(model.kind, ModelKind::Widget);
        assert_eq!(model.widget_node_type(), Some("vserver"));

        assert!(matches!(
            find_model(&graph, "vserver-widget", "2.0"),
            Err(Error::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let vertex = model_vertex("m1", "x", "gadget", "x");
        assert!(matches!(ModelDef::from_vertex(&vertex), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_linkage_path_parse() {
        let path: LinkagePath = "l-interface | logical-link".parse().unwrap();
        assert_eq!(path.steps, vec!["l-interface", "logical-link"]);
        assert!("||".parse::<LinkagePath>().is_err());
    }

    #[test]
    fn test_constraint_scope_outer_wins() {
        let outer = ModelConstraintDef {
            uuid_to_replace: "ces-1".into(),
            replacement: ConstrainedElementSetDef {
                vertex_id: "ces-outer".into(),
                uuid: "ces-outer".into(),
            },
        };
        let inner = ModelConstraintDef {
            uuid_to_replace: "ces-1".into(),
            replacement: ConstrainedElementSetDef {
                vertex_id: "ces-inner".into(),
                uuid: "ces-inner".into(),
            },
        };

        let scope = ConstraintScope::new()
            .with_constraints(vec![outer])
            .with_constraints(vec![inner]);
        assert_eq!(scope.replacement_for("ces-1").unwrap().uuid, "ces-outer");
    }

    #[test]
    fn test_resolve_choice_sets() {
        let mut graph = Graph::new();
        graph.add_vertex(
            Vertex::new("ces", node_types::CONSTRAINED_ELEMENT_SET)
                .with_property(props::CONSTRAINED_ELEMENT_SET_UUID, "ces-uuid"),
        );
        graph.add_vertex(Vertex::new("cs1", node_types::ELEMENT_CHOICE_SET));
        graph.add_vertex(Vertex::new("cs2", node_types::ELEMENT_CHOICE_SET));
        graph.add_vertex(Vertex::new("e1", node_types::MODEL_ELEMENT));
        graph.add_vertex(Vertex::new("e2", node_types::MODEL_ELEMENT));
        graph.connect("ces", "cs1", labels::USES).unwrap();
        graph.connect("ces", "cs2", labels::USES).unwrap();
        graph.connect("cs1", "e1", labels::HAS).unwrap();
        graph.connect("cs2", "e2", labels::HAS).unwrap();

        let node = DefinitionNode::from_vertex(&graph.get_vertex("ces").unwrap()).unwrap();
        let mut ids: Vec<String> = node
            .resolve(&graph, &ConstraintScope::new())
            .unwrap()
            .into_iter()
            .map(|e| e.vertex_id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_property_constraint() {
        let equals = PropertyConstraint {
            constraint_type: ConstraintType::Equals,
            property_name: "prov-status".into(),
            property_value: "ACTIVE".into(),
        };
        let not_equals = PropertyConstraint {
            constraint_type: ConstraintType::NotEquals,
            ..equals.clone()
        };

        let active = Vertex::new("v1", "vserver").with_property("prov-status", "ACTIVE");
        let missing = Vertex::new("v2", "vserver");

        assert!(equals.is_satisfied_by(&active));
        assert!(!equals.is_satisfied_by(&missing));
        assert!(!not_equals.is_satisfied_by(&active));
        assert!(not_equals.is_satisfied_by(&missing));
    }
}
