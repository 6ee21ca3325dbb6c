//! Model-driven commands: topology, collect, delete-plan, delete

use clap::Args;
use serde::Serialize;

use crate::commands::emit;
use crate::output::{render_flags, render_removed, render_topology, render_tree};
use crate::{AppContext, Cli};
use topograph_core::{DeleteFlags, ResultTree};
use topograph_storage::StorageBackend;

/// Identifies a model definition
#[derive(Args)]
pub struct ModelRef {
    /// Model id
    #[arg(short, long)]
    pub model: String,

    /// Model version
    #[arg(long)]
    pub model_version: String,
}

#[derive(Args)]
pub struct TopologyArgs {
    #[command(flatten)]
    pub model: ModelRef,
}

#[derive(Args)]
pub struct InstanceArgs {
    /// Id of the instance's top vertex
    pub root_id: String,

    #[command(flatten)]
    pub model: ModelRef,
}

#[derive(Args)]
pub struct DeletePlanArgs {
    #[command(flatten)]
    pub instance: InstanceArgs,

    /// Also print the per-trail delete flags
    #[arg(long)]
    pub flags: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub instance: InstanceArgs,

    /// Refuse unless the root's resource-version matches
    #[arg(long)]
    pub resource_version: Option<String>,
}

#[derive(Serialize)]
struct DeletePlan<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<&'a DeleteFlags>,
    tree: &'a ResultTree,
}

pub async fn run_topology(args: &TopologyArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let map = service
        .compile_model(&args.model.model, &args.model.model_version)
        .await?;
    tracing::info!("Compiled {} trails for {}", map.len(), args.model.model);
    emit(cli, &map.rendered(), || render_topology(&map))
}

pub async fn run_collect(args: &InstanceArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let tree = service
        .query_by_model(&args.root_id, &args.model.model, &args.model.model_version)
        .await?;
    emit(cli, &tree, || render_tree(&tree, None))
}

pub async fn run_delete_plan(args: &DeletePlanArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let instance = &args.instance;
    let tree = service
        .plan_delete(&instance.root_id, &instance.model.model, &instance.model.model_version)
        .await?;
    let flags = if args.flags {
        Some(
            service
                .delete_flags(&instance.model.model, &instance.model.model_version)
                .await?,
        )
    } else {
        None
    };

    let plan = DeletePlan {
        flags: flags.as_ref(),
        tree: &tree,
    };
    emit(cli, &plan, || {
        let mut out = flags.as_ref().map(render_flags).unwrap_or_default();
        out.push_str(&render_tree(&tree, None));
        out
    })
}

pub async fn run_delete(args: &DeleteArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let service = ctx.service().await?;
    let instance = &args.instance;
    let removed = service
        .delete_by_model(
            &instance.root_id,
            &instance.model.model,
            &instance.model.model_version,
            args.resource_version.clone(),
        )
        .await?;

    let ids: Vec<&str> = removed.keys().map(|id| id.as_str()).collect();
    ctx.storage.delete_vertices_batch(&ids).await?;
    tracing::info!("Removed {} vertices under {}", removed.len(), instance.root_id);

    emit(cli, &removed, || render_removed(&removed))
}
