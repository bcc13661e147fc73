use std::net::SocketAddr;

/// Lifecycle of one SSH connection, as seen by the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connected,
    Authenticating,
    AwaitingShellRequest,
    ShellActive,
    Closed,
}

/// Snapshot published on the session's watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: SessionPhase,
    /// A `session` channel has been opened.
    pub channel_open: bool,
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Connected,
            channel_open: false,
        }
    }
}

/// Per-client session state tracking
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub conn_id: String,
    pub peer: SocketAddr,
    /// Last username offered, overwritten on every attempt.
    pub username: String,
    pub password: String,
}

impl ClientSession {
    pub fn new(peer: SocketAddr, conn_id: String) -> Self {
        Self {
            conn_id,
            peer,
            username: String::new(),
            password: String::new(),
        }
    }

    /// Name shown in the prompt and canned output.
    pub fn display_username(&self) -> &str {
        if self.username.is_empty() {
            "user"
        } else {
            &self.username
        }
    }
}
