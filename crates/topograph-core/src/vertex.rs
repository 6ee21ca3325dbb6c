//! Vertex (node) types and property values

use crate::trail::Persona;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Property holding the persona model id of an instance
pub const PERSONA_MODEL_ID: &str = "persona-model-id";

/// Property holding the persona model version of an instance
pub const PERSONA_MODEL_VERSION: &str = "persona-model-version";

/// Property used for optimistic locking
pub const RESOURCE_VERSION: &str = "resource-version";

/// Unique identifier for a vertex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub String);

impl VertexId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VertexId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VertexId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A property value: a scalar or a set of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Set(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a flag. Accepts booleans and the legacy
    /// `"T"`/`"F"` encoding.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.as_str() {
                "T" | "t" | "true" | "TRUE" | "Y" => Some(true),
                "F" | "f" | "false" | "FALSE" | "N" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Values as a list of strings. A scalar becomes a one-element list.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::Set(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Exact match against a textual value. Sets match if any member does.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Set(items) => items.iter().any(|i| i == value),
            Self::Text(s) => s == value,
            other => other.to_string() == value,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
            Self::Set(items) => write!(f, "[{}]", items.join(",")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        Self::Set(items)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(items: Vec<&str>) -> Self {
        Self::Set(items.into_iter().map(String::from).collect())
    }
}

/// A vertex in the inventory graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Unique identifier
    pub id: VertexId,

    /// Node type tag (e.g. "vserver", "model-element")
    pub node_type: String,

    /// Property bag
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Vertex {
    /// Create a new vertex stamped with a fresh resource version
    pub fn new(id: impl Into<VertexId>, node_type: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            RESOURCE_VERSION.to_string(),
            PropertyValue::Text(Utc::now().timestamp_millis().to_string()),
        );
        Self {
            id: id.into(),
            node_type: node_type.into(),
            properties,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Bind this vertex to the model it was created from
    pub fn with_persona(self, model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        self.with_property(PERSONA_MODEL_ID, model_id.into())
            .with_property(PERSONA_MODEL_VERSION, model_version.into())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_str)
    }

    /// Flag property, `false` when absent or unparseable
    pub fn flag(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(PropertyValue::as_flag)
            .unwrap_or(false)
    }

    /// List property, empty when absent
    pub fn list(&self, name: &str) -> Vec<String> {
        self.properties
            .get(name)
            .map(PropertyValue::as_list)
            .unwrap_or_default()
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.property_str(RESOURCE_VERSION)
    }

    /// The originating model of this instance, if it carries one
    pub fn persona(&self) -> Option<Persona> {
        let model_id = self.property_str(PERSONA_MODEL_ID)?;
        let model_version = self.property_str(PERSONA_MODEL_VERSION)?;
        Some(Persona::new(model_id, model_version))
    }

    /// Exact-match AND over all filters
    pub fn matches_filters(&self, filters: &[(&str, &str)]) -> bool {
        filters.iter().all(|(name, value)| {
            self.properties
                .get(*name)
                .map(|p| p.matches(value))
                .unwrap_or(false)
        })
    }

    /// Short human-readable description used in delete reports
    pub fn describe(&self) -> String {
        format!("{} {}", self.node_type, self.id)
    }
}
