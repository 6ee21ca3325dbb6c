//! Import/Export commands

use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use clap::Args;

use crate::{AppContext, Cli};
use topograph_core::GraphSnapshot;
use topograph_storage::StorageBackend;

#[derive(Args)]
pub struct ImportArgs {
    /// Input file: JSON object with `vertices` and `edges` arrays
    pub file: PathBuf,

    /// Merge with existing data (default: error if the store is not empty)
    #[arg(long)]
    pub merge: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run_import(args: &ImportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Importing from {:?}", args.file);

    let content = std::fs::read_to_string(&args.file)?;
    let incoming: GraphSnapshot = serde_json::from_str(&content)?;

    let mut merged = ctx.storage.load_graph().await?;
    if merged.vertex_count() > 0 && !args.merge {
        anyhow::bail!(
            "Store already holds {} vertices. Use --merge to add to existing data.",
            merged.vertex_count()
        );
    }

    // Check every edge lands on a known vertex before writing anything
    for vertex in &incoming.vertices {
        merged.add_vertex(vertex.clone());
    }
    for edge in &incoming.edges {
        merged.add_edge(edge.clone())?;
    }

    ctx.storage.save_vertices_batch(&incoming.vertices).await?;
    ctx.storage.save_edges_batch(&incoming.edges).await?;

    tracing::info!(
        "Store now holds {} vertices and {} edges",
        merged.vertex_count(),
        merged.edge_count()
    );
    println!(
        "Imported {} vertices and {} edges from {:?}",
        incoming.vertices.len(),
        incoming.edges.len(),
        args.file
    );

    Ok(())
}

pub async fn run_export(args: &ExportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::info!("Exporting data");

    let snapshot = GraphSnapshot {
        vertices: ctx.storage.get_all_vertices().await?,
        edges: ctx.storage.get_all_edges().await?,
    };
    tracing::debug!(
        "Exporting {} vertices, {} edges",
        snapshot.vertices.len(),
        snapshot.edges.len()
    );

    let content = serde_json::to_string_pretty(&snapshot)?;

    if let Some(ref path) = args.output {
        // Write with secure permissions (0o600 = owner read/write only)
        #[cfg(unix)]
        {
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)?;
            file.write_all(content.as_bytes())?;
        }
        #[cfg(not(unix))]
        {
            std::fs::write(path, &content)?;
        }
        println!("Exported to {:?}", path);
    } else {
        println!("{}", content);
    }

    Ok(())
}
