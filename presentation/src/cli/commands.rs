//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns, one row per document
    Table,
    /// Pretty-printed JSON array
    Json,
}

impl From<OutputFormat> for nlq_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => nlq_domain::OutputFormat::Table,
            OutputFormat::Json => nlq_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for inventory-nlq
#[derive(Parser, Debug)]
#[command(name = "inventory-nlq")]
#[command(author, version, about = "Ask inventory questions in plain language")]
#[command(long_about = r#"
inventory-nlq turns a plain-language question into a MongoDB-style query,
scopes it to a single tenant and runs it against the inventory data.

Every query is rewritten so that it only ever reads the tenant's own
documents, whatever the language model produced.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./nlq.toml          Project-level config
3. ~/.config/inventory-nlq/config.toml   Global config

Example:
  inventory-nlq --tenant acme "products with less than 10 units left"
  inventory-nlq --tenant acme --explain -o json "top 5 suppliers by invoices"
  inventory-nlq --tenant acme --chat --data demos/inventory.json
"#)]
pub struct Cli {
    /// The question to translate (not required in chat mode)
    pub prompt: Option<String>,

    /// Tenant the question is answered for
    #[arg(short, long, value_name = "ID")]
    pub tenant: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// JSON seed file for the in-memory store ({"collection": [documents]})
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Output format (defaults to [output] format, then table)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Print the tenant-scoped query before the results
    #[arg(long)]
    pub explain: bool,

    /// Print the schema catalog and exit
    #[arg(long)]
    pub show_catalog: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_shot_arguments() {
        let cli = Cli::try_parse_from([
            "inventory-nlq",
            "--tenant",
            "acme",
            "-o",
            "json",
            "--explain",
            "low stock products",
        ])
        .unwrap();
        assert_eq!(cli.tenant.as_deref(), Some("acme"));
        assert_eq!(cli.prompt.as_deref(), Some("low stock products"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(cli.explain);
        assert!(!cli.chat);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["inventory-nlq", "-vv", "--chat"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.chat);
        assert!(cli.tenant.is_none());
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        assert!(Cli::try_parse_from(["inventory-nlq", "-o", "csv", "x"]).is_err());
    }

    #[test]
    fn test_output_format_maps_to_domain() {
        assert_eq!(
            nlq_domain::OutputFormat::from(OutputFormat::Json),
            nlq_domain::OutputFormat::Json
        );
    }
}
