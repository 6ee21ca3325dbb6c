//! Tag-guided search commands

use clap::Args;

use crate::commands::emit;
use crate::output::{render_tree, render_vertices};
use crate::{AppContext, Cli};
use topograph_core::{run_with_time_limit, Direction, GraphStore};
use topograph_search::{collect_tagged, find_top_nodes, CollectOptions, SearchResult, StartFilter};
use topograph_storage::StorageBackend;

fn parse_start_filter(s: &str) -> Result<StartFilter, String> {
    s.parse::<StartFilter>().map_err(|e| e.to_string())
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse()
}

#[derive(Args)]
pub struct FindTopArgs {
    /// Start vertices, `node-type[:property=value,...]`
    #[arg(value_parser = parse_start_filter)]
    pub start: StartFilter,

    /// Node type to stop at
    #[arg(long)]
    pub top: String,

    /// Edge tag to follow
    #[arg(long)]
    pub tag: String,

    /// Walk direction: out, in, both
    #[arg(long, default_value = "out", value_parser = parse_direction)]
    pub direction: Direction,

    /// Level limit (default: engine max_levels)
    #[arg(long)]
    pub max_levels: Option<u32>,
}

#[derive(Args)]
pub struct CollectTaggedArgs {
    /// Id of the vertex to collect under
    pub vertex_id: String,

    /// Edge tag to follow
    #[arg(long)]
    pub tag: String,

    /// Walk direction: out, in, both
    #[arg(long, default_value = "out", value_parser = parse_direction)]
    pub direction: Direction,

    /// Level limit (default: engine max_levels)
    #[arg(long)]
    pub max_levels: Option<u32>,

    /// Leave this node type out entirely (repeatable)
    #[arg(long)]
    pub trim: Vec<String>,

    /// Stop below this node type unless at the kept instance
    #[arg(long, value_name = "NODE-TYPE=KEEP-ID", value_parser = crate::commands::parse_pair)]
    pub prune: Option<(String, String)>,
}

pub async fn run_find_top(args: &FindTopArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let graph = ctx.storage.load_graph().await?;
    let engine = &ctx.config.engine;
    let max_levels = args.max_levels.unwrap_or(engine.max_levels);

    let start = args.start.clone();
    let (top, tag, direction) = (args.top.clone(), args.tag.clone(), args.direction);
    let found = run_with_time_limit(engine.time_limit(), move || {
        find_top_nodes(&graph, &start, &top, &tag, direction, max_levels)
    })
    .await?;

    tracing::info!("Found {} {} vertices", found.len(), args.top);
    emit(cli, &found, || render_vertices(&found))
}

pub async fn run_collect_tagged(
    args: &CollectTaggedArgs,
    cli: &Cli,
    ctx: &AppContext,
) -> anyhow::Result<()> {
    let graph = ctx.storage.load_graph().await?;
    let engine = &ctx.config.engine;

    let mut options = CollectOptions::new(&args.tag, args.max_levels.unwrap_or(engine.max_levels))
        .with_direction(args.direction);
    for node_type in &args.trim {
        options = options.with_trim(node_type);
    }
    if let Some((node_type, keep_id)) = &args.prune {
        options = options.with_prune(node_type, keep_id);
    }

    let vertex_id = args.vertex_id.clone();
    let tree = run_with_time_limit(engine.time_limit(), move || -> SearchResult<_> {
        let top = graph.get_vertex(&vertex_id)?;
        collect_tagged(&graph, &top, &options)
    })
    .await?;

    emit(cli, &tree, || render_tree(&tree, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use topograph_core::ErrorKind;
    use topograph_search::SearchError;

    #[tokio::test]
    async fn test_search_past_time_limit_is_a_limit_error() {
        let err = run_with_time_limit(Duration::from_millis(20), || -> SearchResult<()> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, SearchError::Graph(_)));
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    }
}
