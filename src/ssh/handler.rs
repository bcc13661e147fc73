use crate::attempts::record::AttemptRecord;
use crate::auth::AuthDecision;
use crate::context::AppContext;
use crate::shell::banner::render_banner;
use crate::shell::{ShellExit, ShellInput, ShellSession, TerminalWriter};
use crate::ssh::session::{ClientSession, SessionPhase, SessionProgress};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use russh::server::{Auth, Handle, Msg, Session};
use russh::{Channel, ChannelId, ChannelMsg, CryptoVec};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Maximum number of session channels per SSH connection to prevent resource exhaustion.
pub const MAX_CHANNELS_PER_CONNECTION: usize = 10;

/// Writes shell output to one channel through the session handle.
pub struct ChannelWriter {
    handle: Handle,
    channel: ChannelId,
}

impl ChannelWriter {
    pub fn new(handle: Handle, channel: ChannelId) -> Self {
        Self { handle, channel }
    }
}

impl TerminalWriter for ChannelWriter {
    async fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.handle
            .data(self.channel, CryptoVec::from_slice(bytes))
            .await
            .map_err(|_| anyhow::anyhow!("channel {:?} closed", self.channel))
    }
}

/// Per-connection SSH handler
pub struct HoneypotHandler {
    ctx: Arc<AppContext>,
    session_state: ClientSession,
    progress: watch::Sender<SessionProgress>,
    /// Opened channels still waiting for a shell or exec request, with
    /// whatever the client typed in the meantime
    pending: HashMap<ChannelId, mpsc::UnboundedReceiver<ShellInput>>,
    shells: HashSet<ChannelId>,
}

impl HoneypotHandler {
    pub fn new(
        ctx: Arc<AppContext>,
        peer_addr: SocketAddr,
        conn_id: String,
        progress: watch::Sender<SessionProgress>,
    ) -> Self {
        Self {
            ctx,
            session_state: ClientSession::new(peer_addr, conn_id),
            progress,
            pending: HashMap::new(),
            shells: HashSet::new(),
        }
    }

    fn phase(&self) -> SessionPhase {
        self.progress.borrow().phase
    }

    fn channel_count(&self) -> usize {
        self.pending.len() + self.shells.len()
    }

    fn would_accept_new_channel(&self) -> bool {
        self.channel_count() < MAX_CHANNELS_PER_CONNECTION
    }

    /// Move the session forward. `Closed` is terminal.
    fn advance(&self, phase: SessionPhase) {
        self.progress.send_if_modified(|p| {
            if p.phase == SessionPhase::Closed || p.phase == phase {
                return false;
            }
            p.phase = phase;
            true
        });
    }

    /// Record a password attempt and move past authentication on accept.
    fn handle_password(&mut self, user: &str, password: &str) -> AuthDecision {
        self.advance(SessionPhase::Authenticating);
        let decision = self
            .ctx
            .credentials
            .capture(&mut self.session_state, user, password);
        if decision == AuthDecision::Accept && self.phase() == SessionPhase::Authenticating {
            self.advance(SessionPhase::AwaitingShellRequest);
        }
        decision
    }

    fn exec_reply(command: &str) -> String {
        format!("Command '{}' executed.\r\n$ ", command)
    }

    fn spawn_shell(
        &mut self,
        channel_id: ChannelId,
        input: mpsc::UnboundedReceiver<ShellInput>,
        handle: Handle,
    ) {
        self.shells.insert(channel_id);
        self.advance(SessionPhase::ShellActive);

        let shell = ShellSession::new(
            self.session_state.clone(),
            self.ctx.dispatcher(),
            self.ctx.sink.clone(),
        );
        let writer = ChannelWriter::new(handle.clone(), channel_id);
        let banner = render_banner(chrono::Local::now());
        let progress = self.progress.clone();
        let conn_id = self.session_state.conn_id.clone();

        tokio::spawn(async move {
            let exit = shell.run(input, writer, Some(banner)).await;
            debug!(conn_id = %conn_id, exit = ?exit, "Shell ended");
            if exit != ShellExit::WriteFailed {
                let _ = handle.eof(channel_id).await;
                let _ = handle.close(channel_id).await;
            }
            progress.send_modify(|p| p.phase = SessionPhase::Closed);
        });
    }

    fn release_channel(&mut self, channel: ChannelId) {
        self.pending.remove(&channel);
        self.shells.remove(&channel);
        if self.channel_count() == 0 && self.phase() == SessionPhase::ShellActive {
            self.advance(SessionPhase::Closed);
        }
    }
}

impl russh::server::Handler for HoneypotHandler {
    type Error = anyhow::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        match self.handle_password(user, password) {
            AuthDecision::Accept => Ok(Auth::Accept),
            AuthDecision::Reject => Ok(Auth::Reject {
                proceed_with_methods: None,
                partial_success: false,
            }),
        }
    }

    /// Refuse keys so clients fall back to passwords.
    async fn auth_publickey(
        &mut self,
        user: &str,
        _public_key: &russh::keys::PublicKey,
    ) -> Result<Auth, Self::Error> {
        self.advance(SessionPhase::Authenticating);
        debug!(conn_id = %self.session_state.conn_id, user = %user, "Public key auth rejected");
        Ok(Auth::Reject {
            proceed_with_methods: None,
            partial_success: false,
        })
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        if !self.would_accept_new_channel() {
            warn!(
                conn_id = %self.session_state.conn_id,
                max = MAX_CHANNELS_PER_CONNECTION,
                "Max session channels per connection exceeded, channel rejected"
            );
            return Ok(false);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.insert(channel.id(), rx);
        tokio::spawn(pump_channel(channel, tx));
        self.progress.send_modify(|p| p.channel_open = true);
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let Some(input) = self.pending.remove(&channel) else {
            let _ = session.channel_failure(channel);
            return Ok(());
        };
        let _ = session.channel_success(channel);
        info!(
            conn_id = %self.session_state.conn_id,
            ip = %self.session_state.peer.ip(),
            user = %self.session_state.username,
            "Shell started"
        );
        self.spawn_shell(channel, input, session.handle());
        Ok(())
    }

    /// One-shot `ssh host cmd`: record it, acknowledge and close the channel.
    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        // Input for an exec channel is read and discarded by its pump
        let Some(_input) = self.pending.remove(&channel) else {
            let _ = session.channel_failure(channel);
            return Ok(());
        };
        let _ = session.channel_success(channel);
        self.advance(SessionPhase::ShellActive);

        let command = String::from_utf8_lossy(data).into_owned();
        let state = &self.session_state;
        let record = AttemptRecord::command(&state.peer, &state.username, &state.password, &command);
        if let Err(e) = self.ctx.sink.append(record) {
            warn!(conn_id = %state.conn_id, error = %e, "Failed to record command");
        }
        info!(
            conn_id = %state.conn_id,
            ip = %state.peer.ip(),
            user = %state.username,
            command = %command,
            "Exec command"
        );

        let reply = Self::exec_reply(&command);
        let _ = session.data(channel, CryptoVec::from_slice(reply.as_bytes()));
        let _ = session.exit_status_request(channel, 0);
        let _ = session.eof(channel);
        let _ = session.close(channel);
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.release_channel(channel);
        Ok(())
    }

    /// Reject SFTP/SCP subsystem requests explicitly.
    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        warn!(
            conn_id = %self.session_state.conn_id,
            subsystem = %name,
            ip = %self.session_state.peer.ip(),
            "Subsystem denied"
        );
        let _ = session.channel_failure(channel);
        Ok(())
    }

    /// Reject reverse port forwarding (ssh -R).
    async fn tcpip_forward(
        &mut self,
        address: &str,
        port: &mut u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.session_state.conn_id,
            address = %address,
            port = %port,
            ip = %self.session_state.peer.ip(),
            "Reverse forwarding denied"
        );
        Ok(false)
    }

    /// Reject local port forwarding (ssh -L / -D).
    async fn channel_open_direct_tcpip(
        &mut self,
        channel: Channel<Msg>,
        host_to_connect: &str,
        port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        warn!(
            conn_id = %self.session_state.conn_id,
            host = %host_to_connect,
            port = %port_to_connect,
            ip = %self.session_state.peer.ip(),
            "Direct-tcpip channel denied"
        );
        drop(channel);
        Ok(false)
    }
}

/// Forward a channel's data and EOF to its shell input.
///
/// russh queues every message for the `Channel` before calling the handler
/// and waits when that queue is full, so the channel is read until russh
/// drops it even after the receiving side has gone away.
async fn pump_channel(mut channel: Channel<Msg>, input: mpsc::UnboundedSender<ShellInput>) {
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                let _ = input.send(ShellInput::Data(data.to_vec()));
            }
            ChannelMsg::Eof => {
                let _ = input.send(ShellInput::Eof);
            }
            ChannelMsg::Close => break,
            _ => {}
        }
    }
}
