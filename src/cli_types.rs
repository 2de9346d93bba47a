use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Extract a concept catalog from Python sources and YAML configuration.
#[derive(Parser, Debug)]
#[command(
    name = "ontoscan",
    version,
    about = "Extract a concept catalog from Python sources and YAML configuration",
    long_about = r#"
Extract a concept catalog from Python sources and YAML configuration.

Examples:
    ontoscan                            # Same as 'ontoscan extract'
    ontoscan --repo ../monty extract    # Catalog another checkout
    ontoscan analyze --search evidence  # Statistics plus a keyword search
    ontoscan insights --top 10          # Naming and hotspot insights
    ontoscan verify --expect-total 3352 # Check catalog invariants and counts
"#
)]
pub struct Cli {
    /// Repository root the configured roots are resolved against
    #[arg(long, global = true, default_value = ".", env = "ONTOSCAN_REPO")]
    pub repo: PathBuf,

    /// Configuration file (defaults to ontoscan.toml in the repository root)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog path, overriding output.path
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the repository and overwrite the catalog
    Extract(ExtractArgs),
    /// Print aggregate statistics about the catalog
    Analyze(AnalyzeArgs),
    /// Print naming and hotspot insights about the catalog
    Insights(InsightsArgs),
    /// Check catalog invariants and expected counts
    Verify(VerifyArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Also list concepts matching this keyword (regex when it has metacharacters)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Rank --search matches by fuzzy score over concept names
    #[arg(long, requires = "search")]
    pub fuzzy: bool,

    /// Similarity threshold for grouping near-duplicate names
    #[arg(long, default_value = "0.85", value_parser = parse_ratio)]
    pub similarity: f64,

    /// Entries shown per section
    #[arg(long, default_value = "20", value_name = "N")]
    pub top: usize,

    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Entries shown per section
    #[arg(long, default_value = "10", value_name = "N")]
    pub top: usize,

    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Fail unless the catalog holds exactly this many records
    #[arg(long, value_name = "N")]
    pub expect_total: Option<usize>,

    /// Fail unless the catalog holds exactly this many configuration records
    #[arg(long, value_name = "N")]
    pub expect_config: Option<usize>,
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value.parse().map_err(|_| format!("'{}' is not a number", value))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("similarity must be between 0 and 1, got {}", ratio))
    }
}
