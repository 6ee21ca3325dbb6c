//! Schema catalog: edge rules plus per-node-type metadata

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::rules::EdgeRuleTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata for one node type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeInfo {
    /// Instances are bound to exactly one originating model
    #[serde(default)]
    pub persona: bool,

    #[serde(default)]
    pub key_properties: Vec<String>,

    #[serde(default)]
    pub unique_properties: Vec<String>,

    #[serde(default)]
    pub indexed_properties: Vec<String>,
}

impl NodeTypeInfo {
    pub fn persona() -> Self {
        Self {
            persona: true,
            ..Default::default()
        }
    }

    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.key_properties = keys.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// Immutable catalog loaded once at start-up and passed by reference
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    edge_rules: EdgeRuleTable,
    node_types: BTreeMap<String, NodeTypeInfo>,
}

impl Catalog {
    pub fn new(edge_rules: EdgeRuleTable, node_types: BTreeMap<String, NodeTypeInfo>) -> Self {
        Self {
            edge_rules,
            node_types,
        }
    }

    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let edge_rules = EdgeRuleTable::new(config.edge_rules)?;
        tracing::debug!(
            "Loaded catalog: {} edge rules, {} node types",
            edge_rules.len(),
            config.node_types.len()
        );
        Ok(Self::new(edge_rules, config.node_types))
    }

    pub fn edge_rules(&self) -> &EdgeRuleTable {
        &self.edge_rules
    }

    pub fn node_type(&self, node_type: &str) -> Option<&NodeTypeInfo> {
        self.node_types.get(node_type)
    }

    /// Whether instances of this node type carry persona identity
    pub fn supports_persona(&self, node_type: &str) -> bool {
        self.node_types
            .get(node_type)
            .map(|info| info.persona)
            .unwrap_or(false)
    }

    pub fn key_properties(&self, node_type: &str) -> &[String] {
        self.node_types
            .get(node_type)
            .map(|info| info.key_properties.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EdgeRule, Multiplicity};

    #[test]
    fn test_catalog_from_config() {
        let mut node_types = BTreeMap::new();
        node_types.insert("service-instance".to_string(), NodeTypeInfo::persona());
        node_types.insert(
            "vserver".to_string(),
            NodeTypeInfo::default().with_keys(&["vserver-id"]),
        );
        let config = CatalogConfig {
            edge_rules: vec![EdgeRule::new(
                "vserver",
                "tenant",
                "owned-by",
                Multiplicity::Many2One,
            )],
            node_types,
        };

        let catalog = Catalog::from_config(config).unwrap();
        assert!(catalog.supports_persona("service-instance"));
        assert!(!catalog.supports_persona("vserver"));
        assert!(!catalog.supports_persona("unknown"));
        assert_eq!(catalog.key_properties("vserver"), ["vserver-id".to_string()]);
        assert!(catalog.edge_rules().lookup("tenant", "vserver").is_some());
    }
}
