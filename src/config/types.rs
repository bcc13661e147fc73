use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Log level enum (replaces stringly-typed field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Operator log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tcp: TcpConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SSH listener and session lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_ssh_listen")]
    pub ssh_listen: String,
    #[serde(default = "default_host_key_path")]
    pub host_key_path: PathBuf,
    /// Identification string sent before key exchange. Mimics a stock Ubuntu sshd.
    #[serde(default = "default_server_id")]
    pub server_id: String,
    /// Seconds allowed between handshake and the first session channel.
    #[serde(default = "default_channel_timeout_secs")]
    pub channel_timeout_secs: u64,
    /// Seconds allowed between channel open and the shell/exec request.
    #[serde(default = "default_shell_timeout_secs")]
    pub shell_timeout_secs: u64,
    /// Idle transport timeout (0 = disabled).
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ssh_listen: default_ssh_listen(),
            host_key_path: default_host_key_path(),
            server_id: default_server_id(),
            channel_timeout_secs: default_channel_timeout_secs(),
            shell_timeout_secs: default_shell_timeout_secs(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

fn default_ssh_listen() -> String {
    "0.0.0.0:2222".to_string()
}

fn default_host_key_path() -> PathBuf {
    PathBuf::from("ssh_host_key")
}

fn default_server_id() -> String {
    "SSH-2.0-OpenSSH_8.2p1 Ubuntu-4ubuntu0.5".to_string()
}

fn default_channel_timeout_secs() -> u64 {
    20
}

fn default_shell_timeout_secs() -> u64 {
    10
}

fn default_inactivity_timeout_secs() -> u64 {
    300
}

fn default_shutdown_timeout() -> u64 {
    10
}

/// Plain TCP banner listener
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TcpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tcp_listen")]
    pub listen: String,
    #[serde(default = "default_tcp_banner")]
    pub banner: String,
    /// How long to wait for the client's first payload.
    #[serde(default = "default_tcp_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: default_tcp_listen(),
            banner: default_tcp_banner(),
            read_timeout_secs: default_tcp_read_timeout_secs(),
        }
    }
}

fn default_tcp_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_tcp_banner() -> String {
    "Welcome to the service!\n".to_string()
}

fn default_tcp_read_timeout_secs() -> u64 {
    30
}

/// Decoy web login page
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_http_listen")]
    pub listen: String,
    /// Larger request bodies are refused with 413 and not recorded.
    #[serde(default = "default_http_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_http_listen(),
            max_body_bytes: default_http_max_body_bytes(),
        }
    }
}

fn default_http_listen() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_http_max_body_bytes() -> usize {
    64 * 1024
}

/// Emulated shell settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Cosmetic pause before the sudo refusal.
    #[serde(default = "default_sudo_delay_ms")]
    pub sudo_delay_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            sudo_delay_ms: default_sudo_delay_ms(),
        }
    }
}

fn default_hostname() -> String {
    "prod-server".to_string()
}

fn default_sudo_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Directory receiving the daily attempt files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}
