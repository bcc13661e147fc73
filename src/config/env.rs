//! Environment variable overrides.
//!
//! Variable names follow the `HONEYPOT_*` convention so existing container
//! setups keep working. Empty values are ignored.

use crate::config::types::*;
use std::path::PathBuf;

/// Apply `HONEYPOT_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`] with an injectable lookup, so tests do not
/// have to mutate the process environment.
pub fn apply_overrides_from<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("HONEYPOT_SSH_LISTEN") {
        config.server.ssh_listen = v;
    }
    if let Some(v) = get("HONEYPOT_HOST_KEY_PATH") {
        config.server.host_key_path = PathBuf::from(v);
    }

    // TCP listener: host and port may be overridden independently
    if get("HONEYPOT_HOST").is_some() || get("HONEYPOT_PORT").is_some() {
        let (cur_host, cur_port) = split_host_port(&config.tcp.listen);
        let host = get("HONEYPOT_HOST").unwrap_or(cur_host);
        let port = get("HONEYPOT_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(cur_port);
        config.tcp.listen = format!("{}:{}", host, port);
    }
    if let Some(v) = get("HONEYPOT_TCP_ENABLED") {
        config.tcp.enabled = parse_bool(&v);
    }

    if let Some(v) = get("HONEYPOT_HTTP_LISTEN") {
        config.http.listen = v;
    }
    if let Some(v) = get("HONEYPOT_HTTP_ENABLED") {
        config.http.enabled = parse_bool(&v);
    }

    if let Some(v) = get("HONEYPOT_HOSTNAME") {
        config.shell.hostname = v;
    }

    if let Some(v) = get("HONEYPOT_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(v);
    }
    if let Some(v) = get("HONEYPOT_LOG_LEVEL") {
        if let Ok(level) = parse_log_level(&v) {
            config.logging.level = level;
        }
    }
    if let Some(v) = get("HONEYPOT_LOG_FORMAT") {
        if let Ok(format) = parse_log_format(&v) {
            config.logging.format = format;
        }
    }
}

fn split_host_port(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(8080)),
        None => (addr.to_string(), 8080),
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "t")
}

pub fn parse_log_level(s: &str) -> anyhow::Result<LogLevel> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => anyhow::bail!("invalid log level '{other}'"),
    }
}

pub fn parse_log_format(s: &str) -> anyhow::Result<LogFormat> {
    match s.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("invalid log format '{other}'"),
    }
}
