//! Result tree shared by every traversal

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::vertex::{PropertyValue, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How much of a node's property bag a consumer should see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyLimit {
    #[serde(rename = "SHOW-ALL")]
    ShowAll,
    #[serde(rename = "SHOW-NONE")]
    ShowNone,
    #[serde(rename = "SHOW-NAME-AND-KEYS-ONLY")]
    NameAndKeysOnly,
}

impl std::str::FromStr for PropertyLimit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SHOW-ALL" => Ok(Self::ShowAll),
            "SHOW-NONE" => Ok(Self::ShowNone),
            "SHOW-NAME-AND-KEYS-ONLY" => Ok(Self::NameAndKeysOnly),
            other => Err(Error::InvalidNamedQuery(format!(
                "unknown property-limit-desc: {}",
                other
            ))),
        }
    }
}

/// One node of a result tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTree {
    pub vertex: Vertex,

    /// Key of the topology position this vertex was found at
    pub trail: String,

    #[serde(default)]
    pub delete: bool,

    #[serde(default)]
    pub do_not_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_limit: Option<PropertyLimit>,

    /// Properties to report instead of the full bag
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub property_overrides: BTreeMap<String, PropertyValue>,

    /// Properties joined in from related lookups
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_properties: BTreeMap<String, PropertyValue>,

    #[serde(default)]
    pub children: Vec<ResultTree>,
}

impl ResultTree {
    pub fn new(vertex: Vertex, trail: impl Into<String>) -> Self {
        Self {
            vertex,
            trail: trail.into(),
            delete: false,
            do_not_output: false,
            property_limit: None,
            property_overrides: BTreeMap::new(),
            extra_properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ResultTree) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> &VertexId {
        &self.vertex.id
    }

    /// Whether this node or any descendant is a `node_type` vertex whose
    /// `property_name` equals `property_value`
    pub fn any_node_matches(&self, node_type: &str, property_name: &str, property_value: &str) -> bool {
        if self.vertex.node_type == node_type
            && self
                .vertex
                .property(property_name)
                .map(|p| p.matches(property_value))
                .unwrap_or(false)
        {
            return true;
        }
        self.children
            .iter()
            .any(|c| c.any_node_matches(node_type, property_name, property_value))
    }

    /// Total nodes in this tree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ResultTree::node_count).sum::<usize>()
    }

    /// Vertex ids in pre-order
    pub fn vertex_ids(&self) -> Vec<&VertexId> {
        let mut ids = vec![&self.vertex.id];
        for child in &self.children {
            ids.extend(child.vertex_ids());
        }
        ids
    }

    /// Replace every node flagged do-not-output with its (collapsed)
    /// children. A flagged root yields several independent trees.
    pub fn collapse_do_not_output(self) -> Vec<ResultTree> {
        let mut node = self;
        let children = std::mem::take(&mut node.children);
        let collapsed: Vec<ResultTree> = children
            .into_iter()
            .flat_map(ResultTree::collapse_do_not_output)
            .collect();
        if node.do_not_output {
            collapsed
        } else {
            node.children = collapsed;
            vec![node]
        }
    }

    /// Collapse a whole result set
    pub fn collapse_all(trees: Vec<ResultTree>) -> Vec<ResultTree> {
        trees
            .into_iter()
            .flat_map(ResultTree::collapse_do_not_output)
            .collect()
    }

    /// Properties a consumer should see, honouring overrides and the
    /// property limit
    pub fn visible_properties(&self, catalog: &Catalog) -> BTreeMap<String, PropertyValue> {
        let base = if self.property_overrides.is_empty() {
            &self.vertex.properties
        } else {
            &self.property_overrides
        };
        let mut visible: BTreeMap<String, PropertyValue> = match self.property_limit {
            Some(PropertyLimit::ShowNone) => BTreeMap::new(),
            Some(PropertyLimit::NameAndKeysOnly) => {
                let keys = catalog.key_properties(&self.vertex.node_type);
                base.iter()
                    .filter(|(k, _)| keys.contains(k) || k.ends_with("-name"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
            Some(PropertyLimit::ShowAll) | None => base.clone(),
        };
        if self.property_limit != Some(PropertyLimit::ShowNone) {
            visible.extend(self.extra_properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        visible
    }
}
