pub mod banner;
pub mod commands;
pub mod terminal;

use crate::attempts::record::AttemptRecord;
use crate::attempts::LogSink;
use crate::ssh::session::ClientSession;
use anyhow::Result;
use commands::{Dispatcher, OutputChunk};
use std::future::Future;
use std::sync::Arc;
use terminal::{EditAction, LineEditor};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Where the emulated shell writes its output.
pub trait TerminalWriter: Send {
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Input delivered to a running shell by the SSH handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Data(Vec<u8>),
    Eof,
}

/// Why the shell loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// exit, logout or quit
    Logout,
    /// Channel EOF, channel close or transport gone
    Eof,
    /// The client could no longer be written to
    WriteFailed,
}

/// An emulated shell attached to one SSH channel
pub struct ShellSession {
    editor: LineEditor,
    dispatcher: Dispatcher,
    sink: Arc<dyn LogSink>,
    client: ClientSession,
    closed: bool,
}

impl ShellSession {
    pub fn new(client: ClientSession, dispatcher: Dispatcher, sink: Arc<dyn LogSink>) -> Self {
        Self {
            editor: LineEditor::new(),
            dispatcher,
            sink,
            client,
            closed: false,
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:~$ ",
            self.client.display_username(),
            self.dispatcher.hostname()
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send the optional banner followed by the first prompt.
    pub async fn start<W: TerminalWriter>(
        &mut self,
        writer: &mut W,
        banner: Option<&str>,
    ) -> Result<()> {
        if let Some(banner) = banner {
            writer.write(banner.as_bytes()).await?;
        }
        writer.write(self.prompt().as_bytes()).await
    }

    /// Feed client bytes through the line editor, dispatching completed lines.
    ///
    /// Returns `Some(ShellExit::Logout)` once an exit alias was dispatched;
    /// any bytes after it are ignored.
    pub async fn handle_input<W: TerminalWriter>(
        &mut self,
        data: &[u8],
        writer: &mut W,
    ) -> Result<Option<ShellExit>> {
        if self.closed {
            return Ok(Some(ShellExit::Logout));
        }

        for &byte in data {
            let action = self.editor.process_byte(byte);
            let echo = action.echo();
            if !echo.is_empty() {
                writer.write(echo).await?;
            }

            match action {
                EditAction::Submit(line) => {
                    if self.submit(&line, writer).await? {
                        self.closed = true;
                        return Ok(Some(ShellExit::Logout));
                    }
                    writer.write(self.prompt().as_bytes()).await?;
                }
                EditAction::Interrupt => {
                    writer.write(self.prompt().as_bytes()).await?;
                }
                EditAction::Echo(_) | EditAction::Ignore => {}
            }
        }

        Ok(None)
    }

    /// Record and dispatch one completed line. Returns true on exit.
    async fn submit<W: TerminalWriter>(&mut self, line: &str, writer: &mut W) -> Result<bool> {
        let command = line.trim();
        if command.is_empty() {
            return Ok(false);
        }

        let record = AttemptRecord::command(
            &self.client.peer,
            &self.client.username,
            &self.client.password,
            command,
        );
        if let Err(e) = self.sink.append(record) {
            warn!(conn_id = %self.client.conn_id, error = %e, "Failed to record command");
        }
        info!(
            conn_id = %self.client.conn_id,
            ip = %self.client.peer.ip(),
            user = %self.client.username,
            command = %command,
            "Shell command"
        );

        let result = self
            .dispatcher
            .dispatch(command, self.client.display_username());
        for chunk in &result.output {
            match chunk {
                OutputChunk::Text(text) => writer.write(text.as_bytes()).await?,
                OutputChunk::Pause(delay) => tokio::time::sleep(*delay).await,
            }
        }
        Ok(result.exit_requested)
    }

    /// Drive the shell until logout, EOF or a write failure.
    pub async fn run<W: TerminalWriter>(
        mut self,
        mut input: mpsc::UnboundedReceiver<ShellInput>,
        mut writer: W,
        banner: Option<String>,
    ) -> ShellExit {
        if let Err(e) = self.start(&mut writer, banner.as_deref()).await {
            warn!(conn_id = %self.client.conn_id, error = %e, "Failed to write shell banner");
            return ShellExit::WriteFailed;
        }

        while let Some(msg) = input.recv().await {
            match msg {
                ShellInput::Data(data) => match self.handle_input(&data, &mut writer).await {
                    Ok(Some(exit)) => return exit,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(conn_id = %self.client.conn_id, error = %e, "Shell write failed");
                        return ShellExit::WriteFailed;
                    }
                },
                ShellInput::Eof => break,
            }
        }
        ShellExit::Eof
    }
}
