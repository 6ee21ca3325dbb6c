//! Output formatting utilities

use clap::ValueEnum;
use serde::Serialize;
use topograph_core::{Catalog, DeleteFlags, RemovedVertices, ResultTree, TopologyMap, Vertex};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented listing
    #[default]
    Tree,
    Json,
}

pub fn to_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// One line per node, children indented under their parent. With a
/// catalog, each line also lists the node's visible properties.
pub fn render_tree(tree: &ResultTree, catalog: Option<&Catalog>) -> String {
    let mut out = String::new();
    push_node(&mut out, tree, catalog, 0);
    out
}

pub fn render_trees(trees: &[ResultTree], catalog: Option<&Catalog>) -> String {
    trees.iter().map(|t| render_tree(t, catalog)).collect()
}

fn push_node(out: &mut String, node: &ResultTree, catalog: Option<&Catalog>, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&node.vertex.describe());
    if node.delete {
        out.push_str(" [delete]");
    }
    if let Some(catalog) = catalog {
        let props: Vec<String> = node
            .visible_properties(catalog)
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !props.is_empty() {
            out.push_str(&format!(" {{{}}}", props.join(", ")));
        }
    }
    out.push('\n');
    for child in &node.children {
        push_node(out, child, catalog, depth + 1);
    }
}

/// `trail -> next step` lines, grouped by trail
pub fn render_topology(map: &TopologyMap) -> String {
    let mut out = format!("root: {}\n", map.root_step());
    for (trail, steps) in map.rendered() {
        for step in steps {
            out.push_str(&format!("{} -> {}\n", trail, step));
        }
    }
    out
}

pub fn render_flags(flags: &DeleteFlags) -> String {
    flags
        .iter()
        .map(|(trail, delete)| format!("{}: {}\n", trail, delete))
        .collect()
}

pub fn render_removed(removed: &RemovedVertices) -> String {
    removed
        .iter()
        .map(|(id, description)| format!("{}  {}\n", id, description))
        .collect()
}

pub fn render_vertices(vertices: &[Vertex]) -> String {
    vertices.iter().map(|v| format!("{}\n", v.describe())).collect()
}
