//! Runner configuration

use std::path::PathBuf;

use clap::{Args, Parser};

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
}

/// Evaluate cart discounts for one checkout.
///
/// Reads the host input document and writes the discount operations to stdout. Logs go
/// to stderr.
#[derive(Debug, Parser)]
#[command(name = "cart-discounts", long_about = None)]
pub(crate) struct RunnerConfig {
    /// Input JSON file. Reads stdin when omitted.
    #[arg(short, long)]
    pub(crate) input: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long)]
    pub(crate) pretty: bool,

    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,
}
