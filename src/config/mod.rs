pub mod env;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;
use types::AppConfig;

/// Maximum config file size (1 MB)
const MAX_CONFIG_SIZE: u64 = 1_048_576;

/// Load and validate configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("reading config metadata: {}", path.display()))?;
    if metadata.len() > MAX_CONFIG_SIZE {
        anyhow::bail!(
            "config file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_CONFIG_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    parse_config(&content)
}

/// Resolve the effective configuration: the file when it exists, built-in
/// defaults otherwise, then `HONEYPOT_*` environment overrides on top.
///
/// Returns the config and whether a file was actually read.
pub fn load_effective(path: &Path) -> Result<(AppConfig, bool)> {
    let (mut config, from_file) = if path.exists() {
        (load_config(path)?, true)
    } else {
        (AppConfig::default(), false)
    };
    env::apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok((config, from_file))
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content).context("parsing TOML configuration")?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_server(config)?;
    validate_tcp(config)?;
    validate_http(config)?;
    validate_shell(config)?;
    Ok(())
}

fn validate_server(config: &AppConfig) -> Result<()> {
    if config.server.ssh_listen.is_empty() {
        anyhow::bail!("server.ssh_listen must not be empty");
    }
    if !config.server.server_id.starts_with("SSH-2.0-") {
        anyhow::bail!(
            "server.server_id must start with 'SSH-2.0-' (got '{}')",
            config.server.server_id
        );
    }
    if config.server.channel_timeout_secs == 0 {
        anyhow::bail!("server.channel_timeout_secs must be > 0");
    }
    if config.server.shell_timeout_secs == 0 {
        anyhow::bail!("server.shell_timeout_secs must be > 0");
    }
    Ok(())
}

fn validate_tcp(config: &AppConfig) -> Result<()> {
    if config.tcp.enabled && config.tcp.listen.is_empty() {
        anyhow::bail!("tcp.listen must not be empty when tcp.enabled = true");
    }
    if config.tcp.enabled && config.tcp.read_timeout_secs == 0 {
        anyhow::bail!("tcp.read_timeout_secs must be > 0");
    }
    Ok(())
}

fn validate_http(config: &AppConfig) -> Result<()> {
    if config.http.enabled && config.http.listen.is_empty() {
        anyhow::bail!("http.listen must not be empty when http.enabled = true");
    }
    if config.http.max_body_bytes == 0 {
        anyhow::bail!("http.max_body_bytes must be > 0");
    }
    Ok(())
}

fn validate_shell(config: &AppConfig) -> Result<()> {
    let hostname = &config.shell.hostname;
    if hostname.is_empty() {
        anyhow::bail!("shell.hostname must not be empty");
    }
    if hostname.chars().any(|c| c.is_whitespace() || c.is_control()) {
        anyhow::bail!("shell.hostname must not contain whitespace or control characters");
    }
    Ok(())
}
