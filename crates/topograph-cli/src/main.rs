//! Topograph CLI - model-driven queries over an inventory graph

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, io, model, named_query, search};
use config::Config;
use output::OutputFormat;
use topograph_core::QueryService;
use topograph_storage::{RedbStorage, StorageBackend};

#[derive(Parser)]
#[command(name = "topograph")]
#[command(author, version, about = "Model-driven topology queries over an inventory graph")]
pub struct Cli {
    /// Config file
    #[arg(short, long, env = "TOPOGRAPH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, env = "TOPOGRAPH_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree, global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::config_file_path)
    }

    /// Get the data directory path: flag, then config file, then default
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(config::default_data_dir)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load vertices and edges from a JSON graph file
    Import(io::ImportArgs),
    /// Write the stored graph out
    Export(io::ExportArgs),
    /// Compile a model and print its topology map
    Topology(model::TopologyArgs),
    /// Walk one model instance
    Collect(model::InstanceArgs),
    /// Evaluate a named query
    NamedQuery(named_query::NamedQueryArgs),
    /// Show what a model-driven delete would remove
    DeletePlan(model::DeletePlanArgs),
    /// Delete one model instance
    Delete(model::DeleteArgs),
    /// Find top-level vertices over tagged edges
    FindTop(search::FindTopArgs),
    /// Collect everything under a vertex over tagged edges
    CollectTagged(search::CollectTaggedArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend and loaded configuration
pub struct AppContext {
    pub storage: Arc<RedbStorage>,
    pub config: Config,
}

impl AppContext {
    pub async fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load(&cli.config_path())?;
        let data_dir = cli.data_dir(&config);
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join("topograph.redb");
        tracing::debug!("Using database at: {:?}", db_path);

        let storage = RedbStorage::open(&db_path)?;
        storage.initialize().await?;

        Ok(Self {
            storage: Arc::new(storage),
            config,
        })
    }

    /// Load the stored graph into a query service
    pub async fn service(&self) -> anyhow::Result<QueryService> {
        let engine = self.config.engine_context()?;
        let graph = self.storage.load_graph().await?;
        tracing::debug!(
            "Loaded graph with {} vertices and {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(QueryService::new(graph, engine))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting topograph CLI");

    // These never touch the graph
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args, &cli),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli).await?;

    match &cli.command {
        Commands::Import(args) => io::run_import(args, &cli, &ctx).await?,
        Commands::Export(args) => io::run_export(args, &cli, &ctx).await?,
        Commands::Topology(args) => model::run_topology(args, &cli, &ctx).await?,
        Commands::Collect(args) => model::run_collect(args, &cli, &ctx).await?,
        Commands::NamedQuery(args) => named_query::run(args, &cli, &ctx).await?,
        Commands::DeletePlan(args) => model::run_delete_plan(args, &cli, &ctx).await?,
        Commands::Delete(args) => model::run_delete(args, &cli, &ctx).await?,
        Commands::FindTop(args) => search::run_find_top(args, &cli, &ctx).await?,
        Commands::CollectTagged(args) => search::run_collect_tagged(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    ctx.storage.close().await?;
    Ok(())
}
