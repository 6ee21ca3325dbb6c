//! Edge rule table: which node types may connect, and how

use crate::edge::Direction;
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multiplicity class of an edge rule, read as `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "ONE2ONE", alias = "One2One")]
    One2One,
    #[serde(rename = "ONE2MANY", alias = "One2Many")]
    One2Many,
    #[serde(rename = "MANY2ONE", alias = "Many2One")]
    Many2One,
    #[serde(rename = "MANY2MANY", alias = "Many2Many")]
    Many2Many,
}

impl Multiplicity {
    /// Whether one `from` instance may reach at most one `to` instance
    fn single_target(self) -> bool {
        matches!(self, Self::One2One | Self::Many2One)
    }

    /// Whether one `to` instance may be reached by at most one `from` instance
    fn single_source(self) -> bool {
        matches!(self, Self::One2One | Self::One2Many)
    }
}

/// One configured rule for an unordered node-type pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRule {
    pub from: String,
    pub to: String,
    pub label: String,

    /// Direction of the stored edge relative to `from`
    #[serde(default = "default_direction")]
    pub direction: Direction,

    pub multiplicity: Multiplicity,

    /// `to` instances cannot exist without their `from` instance
    #[serde(default)]
    pub dependent: bool,
}

fn default_direction() -> Direction {
    Direction::Outgoing
}

impl EdgeRule {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            direction: Direction::Outgoing,
            multiplicity,
            dependent: false,
        }
    }

    pub fn dependent(mut self) -> Self {
        self.dependent = true;
        self
    }
}

/// A rule found for a pair, and whether it was stored the other way round
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub rule: &'a EdgeRule,
    pub reversed: bool,
}

/// Immutable lookup table over all edge rules
#[derive(Debug, Clone, Default)]
pub struct EdgeRuleTable {
    rules: HashMap<(String, String), EdgeRule>,
}

impl EdgeRuleTable {
    /// Build the table. A pair defined twice with different content is a
    /// configuration error.
    pub fn new(rules: Vec<EdgeRule>) -> Result<Self> {
        let mut table: HashMap<(String, String), EdgeRule> = HashMap::new();
        for rule in rules {
            let key = (rule.from.clone(), rule.to.clone());
            let reverse = (rule.to.clone(), rule.from.clone());
            let existing = table.get(&key).or_else(|| table.get(&reverse));
            if let Some(existing) = existing {
                if *existing != rule {
                    return Err(Error::ConflictingEdgeRule(rule.from, rule.to));
                }
                continue;
            }
            table.insert(key, rule);
        }
        Ok(Self { rules: table })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule for a pair in either orientation
    pub fn lookup(&self, a: &str, b: &str) -> Option<RuleMatch<'_>> {
        if let Some(rule) = self.rules.get(&(a.to_string(), b.to_string())) {
            return Some(RuleMatch {
                rule,
                reversed: false,
            });
        }
        self.rules
            .get(&(b.to_string(), a.to_string()))
            .map(|rule| RuleMatch {
                rule,
                reversed: true,
            })
    }

    /// Like [`lookup`](Self::lookup) but a miss is a configuration error
    pub fn require(&self, a: &str, b: &str) -> Result<RuleMatch<'_>> {
        self.lookup(a, b)
            .ok_or_else(|| Error::MissingEdgeRule(a.to_string(), b.to_string()))
    }

    /// Whether an instance of `from_type` may reach at most one instance of
    /// `to_type`, so that adding a second edge would break the rule.
    pub fn additional_edge_would_break_mult_edge_rule(
        &self,
        from_type: &str,
        to_type: &str,
    ) -> Result<bool> {
        let found = self.require(from_type, to_type)?;
        Ok(if found.reversed {
            found.rule.multiplicity.single_source()
        } else {
            found.rule.multiplicity.single_target()
        })
    }

    /// Instance-aware check: `true` only when the rule is single-valued on the
    /// vertex's side and the vertex already has a neighbour of `to_type`.
    pub fn additional_edge_would_break_for_vertex(
        &self,
        store: &dyn GraphStore,
        vertex_id: &str,
        to_type: &str,
    ) -> Result<bool> {
        let vertex = store.get_vertex(vertex_id)?;
        if !self.additional_edge_would_break_mult_edge_rule(&vertex.node_type, to_type)? {
            return Ok(false);
        }
        let label = &self.require(&vertex.node_type, to_type)?.rule.label;
        let existing = store
            .adjacent(
                vertex_id,
                Direction::Both,
                &crate::edge::EdgeFilter::Label(label.clone()),
            )?
            .into_iter()
            .any(|n| n.node_type == to_type);
        Ok(existing)
    }

    /// Whether `child_type` instances depend on a `parent_type` instance
    pub fn is_dependent(&self, parent_type: &str, child_type: &str) -> bool {
        self.rules
            .get(&(parent_type.to_string(), child_type.to_string()))
            .map(|r| r.dependent)
            .unwrap_or(false)
    }

    /// Node types whose instances depend on `node_type`
    pub fn dependent_node_types(&self, node_type: &str) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .rules
            .values()
            .filter(|r| r.dependent && r.from == node_type)
            .map(|r| r.to.as_str())
            .collect();
        types.sort_unstable();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::vertex::Vertex;

    #[test]
    fn test_many2one_breaks_on_second_edge() {
        let table = EdgeRuleTable::new(vec![EdgeRule::new(
            "vserver",
            "tenant",
            "owned-by",
            Multiplicity::Many2One,
        )])
        .unwrap();

        assert!(table
            .additional_edge_would_break_mult_edge_rule("vserver", "tenant")
            .unwrap());
        // A tenant may own many vservers
        assert!(!table
            .additional_edge_would_break_mult_edge_rule("tenant", "vserver")
            .unwrap());
    }

    #[test]
    fn test_many2many_never_breaks() {
        let table = EdgeRuleTable::new(vec![EdgeRule::new(
            "vserver",
            "tenant",
            "owned-by",
            Multiplicity::Many2Many,
        )])
        .unwrap();

        assert!(!table
            .additional_edge_would_break_mult_edge_rule("vserver", "tenant")
            .unwrap());
    }

    #[test]
    fn test_one2many_read_reversed() {
        let table = EdgeRuleTable::new(vec![EdgeRule::new(
            "generic-vnf",
            "vf-module",
            "has",
            Multiplicity::One2Many,
        )])
        .unwrap();

        assert!(table
            .additional_edge_would_break_mult_edge_rule("vf-module", "generic-vnf")
            .unwrap());
        assert!(!table
            .additional_edge_would_break_mult_edge_rule("generic-vnf", "vf-module")
            .unwrap());
    }

    #[test]
    fn test_missing_rule_is_error() {
        let table = EdgeRuleTable::default();
        assert!(matches!(
            table.require("a", "b"),
            Err(Error::MissingEdgeRule(_, _))
        ));
    }

    #[test]
    fn test_conflicting_rules_rejected() {
        let result = EdgeRuleTable::new(vec![
            EdgeRule::new("a", "b", "x", Multiplicity::One2Many),
            EdgeRule::new("b", "a", "y", Multiplicity::Many2Many),
        ]);
        assert!(matches!(result, Err(Error::ConflictingEdgeRule(_, _))));
    }

    #[test]
    fn test_instance_aware_check() {
        let table = EdgeRuleTable::new(vec![EdgeRule::new(
            "vserver",
            "tenant",
            "owned-by",
            Multiplicity::Many2One,
        )])
        .unwrap();

        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("v1", "vserver"));
        graph.add_vertex(Vertex::new("v2", "vserver"));
        graph.add_vertex(Vertex::new("t1", "tenant"));
        graph.connect("v1", "t1", "owned-by").unwrap();

        assert!(table
            .additional_edge_would_break_for_vertex(&graph, "v1", "tenant")
            .unwrap());
        assert!(!table
            .additional_edge_would_break_for_vertex(&graph, "v2", "tenant")
            .unwrap());
    }

    #[test]
    fn test_dependent_types() {
        let table = EdgeRuleTable::new(vec![
            EdgeRule::new("vserver", "l-interface", "has", Multiplicity::One2Many).dependent(),
            EdgeRule::new("vserver", "volume", "has", Multiplicity::One2Many).dependent(),
            EdgeRule::new("vserver", "tenant", "owned-by", Multiplicity::Many2One),
        ])
        .unwrap();

        assert_eq!(table.dependent_node_types("vserver"), vec!["l-interface", "volume"]);
        assert!(table.is_dependent("vserver", "l-interface"));
        assert!(!table.is_dependent("l-interface", "vserver"));
    }
}
