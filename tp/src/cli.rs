//! CLI command definitions and subcommands

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Trip planner - dish to budget-aware, store-specific shopping list
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Plan a budget-aware grocery trip for a dish",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the whole pipeline once and print the result
    Plan(PlanArgs),

    /// Interactive planning shell
    Repl,

    /// Print the effective configuration
    Config,
}

/// Arguments for `tp plan`
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("location").required(true).args(["address", "lat", "here"])))]
pub struct PlanArgs {
    /// Dish to cook
    #[arg(short, long)]
    pub dish: String,

    /// Number of people
    #[arg(short, long)]
    pub people: u32,

    /// Budget for the whole basket
    #[arg(short, long)]
    pub budget: f64,

    /// Shopping location as free text
    #[arg(short, long)]
    pub address: Option<String>,

    /// Shopping location latitude
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Shopping location longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Use the device position from the config file
    #[arg(long)]
    pub here: bool,

    /// Put every generated ingredient in the basket
    #[arg(long)]
    pub all: bool,

    /// Put one generated ingredient in the basket (repeatable)
    #[arg(short, long = "item", value_name = "NAME")]
    pub items: Vec<String>,

    /// Add a custom item (repeatable)
    #[arg(long = "custom", value_name = "NAME=QTY", value_parser = parse_custom)]
    pub custom: Vec<(String, String)>,

    /// Show totals for this store instead of the cheapest
    #[arg(short, long)]
    pub store: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Write the breakdown as JSON to this path
    #[arg(short, long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

impl PlanArgs {
    /// True when no basket selection flag was given
    pub fn selects_nothing(&self) -> bool {
        !self.all && self.items.is_empty() && self.custom.is_empty()
    }
}

/// Parse `NAME=QTY` for `--custom`
pub fn parse_custom(raw: &str) -> Result<(String, String), String> {
    debug!(%raw, "parse_custom: called");
    let (name, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=QTY, got '{}'", raw))?;
    let (name, quantity) = (name.trim(), quantity.trim());
    if name.is_empty() || quantity.is_empty() {
        return Err(format!("both NAME and QTY are required, got '{}'", raw));
    }
    Ok((name.to_string(), quantity.to_string()))
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs")
        .join("tripplanner.log")
}

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
