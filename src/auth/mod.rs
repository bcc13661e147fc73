//! Credential capture and the pluggable authentication decision.

use crate::attempts::record::AttemptRecord;
use crate::attempts::LogSink;
use crate::ssh::session::ClientSession;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Accept,
    Reject,
}

/// Decides whether a captured credential pair opens a session.
pub trait AuthBackend: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> AuthDecision;
}

/// Grants every attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl AuthBackend for AcceptAll {
    fn authenticate(&self, _username: &str, _password: &str) -> AuthDecision {
        AuthDecision::Accept
    }
}

/// Records every password attempt before asking the backend.
#[derive(Clone)]
pub struct CredentialCapture {
    sink: Arc<dyn LogSink>,
    backend: Arc<dyn AuthBackend>,
}

impl CredentialCapture {
    pub fn new(sink: Arc<dyn LogSink>, backend: Arc<dyn AuthBackend>) -> Self {
        Self { sink, backend }
    }

    /// Capture with the default [`AcceptAll`] backend.
    pub fn accept_all(sink: Arc<dyn LogSink>) -> Self {
        Self::new(sink, Arc::new(AcceptAll))
    }

    pub fn capture(
        &self,
        session: &mut ClientSession,
        username: &str,
        password: &str,
    ) -> AuthDecision {
        session.username = username.to_string();
        session.password = password.to_string();

        let record = AttemptRecord::login_attempt(&session.peer, username, password);
        if let Err(e) = self.sink.append(record) {
            warn!(
                conn_id = %session.conn_id,
                error = %e,
                "Failed to record login attempt"
            );
        }

        info!(
            conn_id = %session.conn_id,
            ip = %session.peer.ip(),
            user = %username,
            password = %password,
            "SSH login attempt"
        );

        self.backend.authenticate(username, password)
    }
}
