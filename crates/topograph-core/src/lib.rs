//! Topograph Core - model-driven topology engine
//!
//! This crate provides the property-graph data model, the schema catalog,
//! the topology compiler and the instance traversals built on it: model
//! queries, named queries and model-driven deletes.

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod delete;
pub mod edge;
pub mod error;
pub mod graph;
pub mod limits;
pub mod named_query;
pub mod result;
pub mod rules;
pub mod service;
pub mod trail;
pub mod traversal;
pub mod vertex;

pub use catalog::{Catalog, NodeTypeInfo};
pub use compiler::{
    compile_model_topology, compile_named_query_topology, ElementDirectives, NamedQueryTopology,
};
pub use config::{CatalogConfig, EngineConfig, EngineContext};
pub use definition::{find_model, find_named_query, ModelDef, ModelElementDef, NamedQueryDef};
pub use delete::{
    delete_model_instance, execute_delete, plan_delete, resolve_deletable,
    resolve_deletable_for_model, DeleteFlags, RemovedVertices,
};
pub use edge::{Direction, Edge, EdgeFilter, EdgeId};
pub use error::{Error, ErrorKind, Result};
pub use graph::{Graph, GraphMutator, GraphSnapshot, GraphStore, Transaction};
pub use named_query::{evaluate_named_query, NamedQueryRequest, SecondaryFilter};
pub use result::{PropertyLimit, ResultTree};
pub use rules::{EdgeRule, EdgeRuleTable, Multiplicity};
pub use service::{run_with_time_limit, QueryService};
pub use trail::{Persona, TopologyMap, Trail, TrailStep};
pub use traversal::{collect_instance, Collector, Visit, VisitHook};
pub use vertex::{PropertyValue, Vertex, VertexId};
