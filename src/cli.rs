//! Command line arguments

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

/// Plan the cheapest way to buy a cart from several sellers
#[derive(Debug, Parser)]
#[command(name = "cartsplit", about, long_about = None)]
pub struct PlanArgs {
    /// YAML fixture describing sellers, products and prices
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Solving strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Exhaustive)]
    pub strategy: Strategy,

    /// Stop the exhaustive search after visiting this many nodes
    #[arg(long)]
    pub max_nodes: Option<u64>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Solving strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Enumerate every single-seller-per-product order.
    Exhaustive,

    /// Solve the continuous relaxation (no shipping, products may be split).
    Relaxed,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
