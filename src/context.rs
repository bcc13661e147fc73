use crate::attempts::LogSink;
use crate::auth::{AcceptAll, AuthBackend, CredentialCapture};
use crate::config::types::AppConfig;
use crate::shell::commands::{CommandTable, Dispatcher};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared, read-only state handed to every connection
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub sink: Arc<dyn LogSink>,
    pub credentials: CredentialCapture,
    pub commands: Arc<CommandTable>,
    pub start_time: Instant,
}

impl AppContext {
    /// Context with the stock command table and the accept-everything backend.
    pub fn new(config: AppConfig, sink: Arc<dyn LogSink>) -> Self {
        Self::with_backend(config, sink, Arc::new(AcceptAll))
    }

    pub fn with_backend(
        config: AppConfig,
        sink: Arc<dyn LogSink>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            credentials: CredentialCapture::new(sink.clone(), backend),
            sink,
            commands: Arc::new(CommandTable::standard()),
            start_time: Instant::now(),
        }
    }

    /// Dispatcher bound to the configured hostname and sudo delay.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.commands.clone(),
            self.config.shell.hostname.clone(),
            Duration::from_millis(self.config.shell.sudo_delay_ms),
        )
    }
}
