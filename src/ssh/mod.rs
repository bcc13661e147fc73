pub mod driver;
pub mod handler;
pub mod keys;
pub mod session;

use crate::config::types::ServerConfig;
use russh::keys::PrivateKey;
use std::time::Duration;

/// Build the russh server configuration shared by every connection.
pub fn build_ssh_config(server: &ServerConfig, host_key: PrivateKey) -> russh::server::Config {
    let mut ssh_config = russh::server::Config::default();
    ssh_config.keys.push(host_key);
    ssh_config.server_id = russh::SshId::Standard(server.server_id.clone());
    ssh_config.auth_rejection_time = Duration::from_secs(1);
    ssh_config.auth_rejection_time_initial = Some(Duration::from_secs(0));
    if server.inactivity_timeout_secs > 0 {
        ssh_config.inactivity_timeout = Some(Duration::from_secs(server.inactivity_timeout_secs));
    }
    ssh_config
}
