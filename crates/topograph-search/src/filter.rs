//! Start-vertex filters

use crate::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use topograph_core::{GraphStore, Vertex};

/// Node type/property pairs whose stored values may differ from the
/// caller's in letter case
const CASE_INSENSITIVE_KEYS: &[(&str, &str)] = &[("pserver", "hostname"), ("generic-vnf", "vnf-name")];

/// Locates start vertices: a node type plus exact property matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartFilter {
    pub node_type: String,
    #[serde(default)]
    pub properties: Vec<(String, String)>,
}

impl StartFilter {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    fn describe(&self) -> String {
        let props: Vec<String> = self
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{} [{}]", self.node_type, props.join(", "))
    }

    fn case_insensitive_property(&self) -> Option<usize> {
        self.properties.iter().position(|(name, _)| {
            CASE_INSENSITIVE_KEYS
                .iter()
                .any(|(t, p)| *t == self.node_type.as_str() && *p == name.as_str())
        })
    }
}

impl std::str::FromStr for StartFilter {
    type Err = SearchError;

    /// Parse `node-type` or `node-type:prop=value[,prop=value...]`
    fn from_str(s: &str) -> SearchResult<Self> {
        let (node_type, rest) = match s.split_once(':') {
            Some((t, rest)) => (t.trim(), Some(rest)),
            None => (s.trim(), None),
        };
        if node_type.is_empty() {
            return Err(SearchError::InvalidFilter(s.to_string()));
        }
        let mut filter = StartFilter::new(node_type);
        for pair in rest.into_iter().flat_map(|r| r.split(',')) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| SearchError::InvalidFilter(s.to_string()))?;
            filter = filter.with_property(name.trim(), value.trim());
        }
        Ok(filter)
    }
}

fn lookup(store: &dyn GraphStore, node_type: &str, properties: &[(String, String)]) -> SearchResult<Vec<Vertex>> {
    let filters: Vec<(&str, &str)> = properties
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Ok(store.find_vertices(node_type, &filters)?)
}

/// Vertices matching `filter`.
///
/// For the legacy `pserver.hostname` and `generic-vnf.vnf-name` keys a miss
/// is retried with the value upper-cased, then lower-cased.
pub fn find_start_vertices(store: &dyn GraphStore, filter: &StartFilter) -> SearchResult<Vec<Vertex>> {
    let found = lookup(store, &filter.node_type, &filter.properties)?;
    if !found.is_empty() {
        return Ok(found);
    }

    if let Some(index) = filter.case_insensitive_property() {
        let original = filter.properties[index].1.clone();
        for retry in [original.to_uppercase(), original.to_lowercase()] {
            if retry == original {
                continue;
            }
            let mut properties = filter.properties.clone();
            properties[index].1 = retry.clone();
            let found = lookup(store, &filter.node_type, &properties)?;
            if !found.is_empty() {
                tracing::debug!("Found {} after retrying {:?} as {:?}", filter.node_type, original, retry);
                return Ok(found);
            }
        }
    }

    Err(SearchError::NoStartVertex(filter.describe()))
}
