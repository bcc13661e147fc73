use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// One captured interaction, serialized as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptRecord {
    LoginAttempt {
        timestamp: DateTime<Utc>,
        ip: String,
        port: u16,
        protocol: String,
        username: String,
        password: String,
        /// Request path of a web form submission
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// Undecoded form body as posted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_data: Option<String>,
    },
    Command {
        timestamp: DateTime<Utc>,
        ip: String,
        port: u16,
        protocol: String,
        username: String,
        password: String,
        command: String,
    },
    Access {
        timestamp: DateTime<Utc>,
        ip: String,
        port: u16,
        protocol: String,
        data: String,
    },
}

impl AttemptRecord {
    pub fn login_attempt(peer: &SocketAddr, username: &str, password: &str) -> Self {
        Self::LoginAttempt {
            timestamp: Utc::now(),
            ip: peer.ip().to_string(),
            port: peer.port(),
            protocol: "ssh".to_string(),
            username: username.to_string(),
            password: password.to_string(),
            path: None,
            raw_data: None,
        }
    }

    /// Credentials posted to the decoy login page.
    pub fn http_login_attempt(
        peer: &SocketAddr,
        path: &str,
        username: &str,
        password: &str,
        raw_data: &str,
    ) -> Self {
        Self::LoginAttempt {
            timestamp: Utc::now(),
            ip: peer.ip().to_string(),
            port: peer.port(),
            protocol: "http".to_string(),
            username: username.to_string(),
            password: password.to_string(),
            path: Some(path.to_string()),
            raw_data: Some(raw_data.to_string()),
        }
    }

    pub fn command(peer: &SocketAddr, username: &str, password: &str, command: &str) -> Self {
        Self::Command {
            timestamp: Utc::now(),
            ip: peer.ip().to_string(),
            port: peer.port(),
            protocol: "ssh".to_string(),
            username: username.to_string(),
            password: password.to_string(),
            command: command.to_string(),
        }
    }

    pub fn access(peer: &SocketAddr, data: &[u8]) -> Self {
        Self::Access {
            timestamp: Utc::now(),
            ip: peer.ip().to_string(),
            port: peer.port(),
            protocol: "tcp".to_string(),
            data: String::from_utf8_lossy(data).into_owned(),
        }
    }

    pub fn http_access(peer: &SocketAddr, method: &str, path: &str) -> Self {
        Self::Access {
            timestamp: Utc::now(),
            ip: peer.ip().to_string(),
            port: peer.port(),
            protocol: "http".to_string(),
            data: format!("HTTP {method} {path}"),
        }
    }

    /// The serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoginAttempt { .. } => "login_attempt",
            Self::Command { .. } => "command",
            Self::Access { .. } => "access",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginAttempt { timestamp, .. }
            | Self::Command { timestamp, .. }
            | Self::Access { timestamp, .. } => *timestamp,
        }
    }

    pub fn ip(&self) -> &str {
        match self {
            Self::LoginAttempt { ip, .. } | Self::Command { ip, .. } | Self::Access { ip, .. } => ip,
        }
    }
}
