//! CLI command implementations

pub mod completions;
pub mod config;
pub mod io;
pub mod model;
pub mod named_query;
pub mod search;

/// Parse a `name=value` argument
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

/// Print `rendered` for tree output, `data` as JSON otherwise
pub fn emit<T: serde::Serialize + ?Sized>(
    cli: &crate::Cli,
    data: &T,
    rendered: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match cli.format {
        crate::output::OutputFormat::Json => println!("{}", crate::output::to_json(data)?),
        crate::output::OutputFormat::Tree => print!("{}", rendered()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("vnf-name = fw1").unwrap(),
            ("vnf-name".to_string(), "fw1".to_string())
        );
        assert!(parse_pair("vnf-name").is_err());
        assert!(parse_pair("=fw1").is_err());
    }
}
