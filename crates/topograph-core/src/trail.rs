//! Trails and the compiled topology map
//!
//! A trail identifies a position in a topology: the sequence of node-type
//! steps from the root. Steps for persona-capable node types also carry the
//! model id and version the instance must originate from. Trails are kept
//! structured internally and rendered to strings only as map keys.

use crate::vertex::Vertex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const STEP_SEPARATOR: &str = "|";

/// Model identity an instance is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Persona {
    pub model_id: String,
    pub model_version: String,
}

impl Persona {
    pub fn new(model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
        }
    }
}

/// One step of a trail
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrailStep {
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
}

impl TrailStep {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            persona: None,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    /// Canonical string form: `node-type` or `node-type,modelId,modelVersion`
    pub fn render(&self) -> String {
        match &self.persona {
            Some(p) => format!("{},{},{}", self.node_type, p.model_id, p.model_version),
            None => self.node_type.clone(),
        }
    }

    /// Whether a vertex can stand at this step
    pub fn matches_vertex(&self, vertex: &Vertex) -> bool {
        if vertex.node_type != self.node_type {
            return false;
        }
        match &self.persona {
            Some(expected) => vertex.persona().as_ref() == Some(expected),
            None => true,
        }
    }
}

impl std::fmt::Display for TrailStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Path of steps from a topology root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trail {
    steps: Vec<TrailStep>,
}

impl Trail {
    pub fn root(step: TrailStep) -> Self {
        Self { steps: vec![step] }
    }

    /// A new trail one step longer
    pub fn extend(&self, step: TrailStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub fn last(&self) -> &TrailStep {
        // A trail is never empty: it is created from a root step.
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[TrailStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Map key for this trail
    pub fn key(&self) -> String {
        self.steps
            .iter()
            .map(TrailStep::render)
            .collect::<Vec<_>>()
            .join(STEP_SEPARATOR)
    }
}

impl std::fmt::Display for Trail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Trail → set of legal next steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyMap {
    root: TrailStep,
    entries: BTreeMap<String, BTreeSet<TrailStep>>,
}

impl TopologyMap {
    pub fn new(root: TrailStep) -> Self {
        Self {
            root,
            entries: BTreeMap::new(),
        }
    }

    /// The declared root step
    pub fn root_step(&self) -> &TrailStep {
        &self.root
    }

    pub fn root_trail(&self) -> Trail {
        Trail::root(self.root.clone())
    }

    /// Record a legal next step; returns false if it was already known
    pub fn insert(&mut self, trail: &Trail, step: TrailStep) -> bool {
        self.entries.entry(trail.key()).or_default().insert(step)
    }

    pub fn next_steps(&self, trail: &Trail) -> impl Iterator<Item = &TrailStep> {
        self.entries.get(&trail.key()).into_iter().flatten()
    }

    /// Number of trails with at least one next step
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Fully string-rendered form, for display and serialization
    pub fn rendered(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.entries
            .iter()
            .map(|(k, steps)| (k.clone(), steps.iter().map(TrailStep::render).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_rendering() {
        let root = TrailStep::new("service-instance").with_persona(Persona::new("svc", "1.0"));
        let trail = Trail::root(root).extend(TrailStep::new("vserver"));

        assert_eq!(trail.key(), "service-instance,svc,1.0|vserver");
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.last().node_type, "vserver");
    }

    #[test]
    fn test_step_matches_persona() {
        let step = TrailStep::new("service-instance").with_persona(Persona::new("svc", "1.0"));

        let bound = Vertex::new("s1", "service-instance").with_persona("svc", "1.0");
        let other = Vertex::new("s2", "service-instance").with_persona("svc", "2.0");
        let unbound = Vertex::new("s3", "service-instance");

        assert!(step.matches_vertex(&bound));
        assert!(!step.matches_vertex(&other));
        assert!(!step.matches_vertex(&unbound));
        assert!(TrailStep::new("service-instance").matches_vertex(&unbound));
    }

    #[test]
    fn test_topology_map_dedupes_steps() {
        let mut map = TopologyMap::new(TrailStep::new("vserver"));
        let root = map.root_trail();

        assert!(map.insert(&root, TrailStep::new("l-interface")));
        assert!(!map.insert(&root, TrailStep::new("l-interface")));
        assert!(map.insert(&root, TrailStep::new("volume")));

        let next: Vec<_> = map.next_steps(&root).map(|s| s.render()).collect();
        assert_eq!(next, vec!["l-interface", "volume"]);
        assert_eq!(map.len(), 1);
        assert!(map
            .next_steps(&root.extend(TrailStep::new("volume")))
            .next()
            .is_none());
    }
}
