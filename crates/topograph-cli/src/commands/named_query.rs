//! Named query command

use clap::Args;

use crate::commands::{emit, parse_pair};
use crate::output::render_trees;
use crate::{AppContext, Cli};
use topograph_core::NamedQueryRequest;

#[derive(Args)]
pub struct NamedQueryArgs {
    /// Named query uuid or name
    pub query: String,

    /// Start vertex filter, `property=value` (repeatable)
    #[arg(long = "filter", value_name = "PROPERTY=VALUE", value_parser = parse_pair)]
    pub filters: Vec<(String, String)>,

    /// Keep only results containing a matching node
    #[arg(long, value_name = "NODE-TYPE:PROPERTY=VALUE", value_parser = parse_secondary)]
    pub secondary: Option<(String, String, String)>,
}

fn parse_secondary(s: &str) -> Result<(String, String, String), String> {
    let (node_type, pair) = s
        .split_once(':')
        .ok_or_else(|| format!("expected node-type:property=value, got '{}'", s))?;
    let (name, value) = parse_pair(pair)?;
    Ok((node_type.trim().to_string(), name, value))
}

pub async fn run(args: &NamedQueryArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let mut request = NamedQueryRequest::new(&args.query);
    for (name, value) in &args.filters {
        request = request.with_filter(name, value);
    }
    if let Some((node_type, name, value)) = &args.secondary {
        request = request.with_secondary_filter(node_type, name, value);
    }

    let service = ctx.service().await?;
    let results = service.query_named(request).await?;
    tracing::info!("Named query {} returned {} trees", args.query, results.len());

    emit(cli, &results, || {
        render_trees(&results, Some(&service.context().catalog))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secondary() {
        assert_eq!(
            parse_secondary("vserver:vserver-name=web").unwrap(),
            (
                "vserver".to_string(),
                "vserver-name".to_string(),
                "web".to_string()
            )
        );
        assert!(parse_secondary("vserver-name=web").is_err());
    }
}
