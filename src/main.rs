use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use sshpot::attempts::reader;
use sshpot::cli::{Cli, Command, OutputFormat, ReportFormat};
use sshpot::config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::CheckConfig) => {
            let (cfg, from_file) = config::load_effective(&cli.config)?;
            println!("Configuration is valid.");
            if from_file {
                println!("  Source:      {}", cli.config.display());
            } else {
                println!("  Source:      built-in defaults (no {})", cli.config.display());
            }
            println!("  SSH listen:  {}", cfg.server.ssh_listen);
            println!("  Server ID:   {}", cfg.server.server_id);
            if cfg.tcp.enabled {
                println!("  TCP listen:  {}", cfg.tcp.listen);
            } else {
                println!("  TCP listen:  disabled");
            }
            if cfg.http.enabled {
                println!("  HTTP listen: {}", cfg.http.listen);
            } else {
                println!("  HTTP listen: disabled");
            }
            println!("  Hostname:    {}", cfg.shell.hostname);
            println!("  Log dir:     {}", cfg.logging.log_dir.display());
            return Ok(());
        }
        Some(Command::ShowConfig { format }) => {
            let (cfg, _) = config::load_effective(&cli.config)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cfg)?),
                OutputFormat::Toml => println!("{}", toml::to_string_pretty(&cfg)?),
            }
            return Ok(());
        }
        Some(Command::Report {
            log_dir,
            top,
            format,
        }) => {
            let dir = match log_dir {
                Some(dir) => dir.clone(),
                None => config::load_effective(&cli.config)?.0.logging.log_dir,
            };
            let summary = reader::summarize(&dir, *top)?;
            match format {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                ReportFormat::Text => print!("{}", summary.render_text()),
            }
            return Ok(());
        }
        None => {}
    }

    let (app_config, from_file) = config::load_effective(&cli.config)?;

    // CLI override > config
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| app_config.logging.level.to_string());
    sshpot::logging::setup_logging(&log_level, app_config.logging.format);

    if !from_file {
        info!(path = %cli.config.display(), "No config file found, using defaults");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        ssh_listen = %app_config.server.ssh_listen,
        hostname = %app_config.shell.hostname,
        "Starting sshpot honeypot"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if let Err(e) = sshpot::server::run(app_config).await {
            error!(error = %e, "Server error");
            std::process::exit(1);
        }
    });

    Ok(())
}
