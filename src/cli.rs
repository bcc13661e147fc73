use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sshpot",
    version,
    about = "Low-interaction SSH and TCP honeypot with an emulated shell"
)]
pub struct Cli {
    /// Path to configuration file (also settable via HONEYPOT_CONFIG env var)
    #[arg(short, long, default_value = "config.toml", env = "HONEYPOT_CONFIG")]
    pub config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate configuration file
    CheckConfig,
    /// Show the effective configuration (file, defaults and env overrides)
    ShowConfig {
        #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
        format: OutputFormat,
    },
    /// Summarize captured attempts from the daily JSONL files
    Report {
        /// Log directory (defaults to logging.log_dir from the config)
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Number of entries in each top-N table
        #[arg(long, default_value = "10")]
        top: usize,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Toml,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}
