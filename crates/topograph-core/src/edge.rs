//! Edge types and traversal direction

use crate::vertex::{PropertyValue, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ulid::Ulid;

/// Suffix marking the reverse-direction counterpart of an edge tag
pub const REVERSE_TAG_SUFFIX: &str = "-REV";

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction for graph traversal, relative to the vertex being expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Both => Self::Both,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "out" | "outgoing" => Ok(Self::Outgoing),
            "in" | "incoming" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Which edges an adjacency query follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeFilter {
    Any,
    Label(String),
    /// Edges carrying the boolean property `tag = true`
    Tag(String),
}

impl EdgeFilter {
    /// The reverse-tag counterpart of a tag filter
    pub fn reverse_tag(tag: &str) -> Self {
        Self::Tag(format!("{}{}", tag, REVERSE_TAG_SUFFIX))
    }

    pub fn accepts(&self, edge: &Edge) -> bool {
        match self {
            Self::Any => true,
            Self::Label(label) => edge.label == *label,
            Self::Tag(tag) => edge.has_tag(tag),
        }
    }
}

/// A directed, labelled edge between two vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: EdgeId,

    /// Source vertex
    pub out_id: VertexId,

    /// Target vertex
    pub in_id: VertexId,

    /// Edge label (e.g. "tosca.relationships.HostedOn", "isA")
    pub label: String,

    /// Boolean tags and other edge properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Edge {
    pub fn new(
        out_id: impl Into<VertexId>,
        in_id: impl Into<VertexId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            out_id: out_id.into(),
            in_id: in_id.into(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a boolean tag on this edge
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.properties.insert(tag.into(), PropertyValue::Bool(true));
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.properties
            .get(tag)
            .and_then(PropertyValue::as_flag)
            .unwrap_or(false)
    }

    /// The endpoint opposite `id`, if `id` is an endpoint at all
    pub fn other_end(&self, id: &str) -> Option<&VertexId> {
        if self.out_id.as_str() == id {
            Some(&self.in_id)
        } else if self.in_id.as_str() == id {
            Some(&self.out_id)
        } else {
            None
        }
    }

    /// Whether this edge leaves or enters `id` in the given direction
    pub fn runs(&self, id: &str, direction: Direction) -> bool {
        match direction {
            Direction::Outgoing => self.out_id.as_str() == id,
            Direction::Incoming => self.in_id.as_str() == id,
            Direction::Both => self.out_id.as_str() == id || self.in_id.as_str() == id,
        }
    }
}
