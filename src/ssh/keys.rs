use anyhow::{Context, Result};
use russh::keys::{Algorithm, HashAlg, PrivateKey};
use std::path::Path;
use tracing::{info, warn};

/// Load the persistent host key, generating an Ed25519 key on first start.
///
/// Reusing the key across restarts keeps returning scanners from seeing a
/// changed host identity.
pub fn load_or_generate_host_key(path: &Path) -> Result<PrivateKey> {
    let key = if path.exists() {
        warn_if_world_readable(path);
        let key = load_host_key(path)?;
        info!(path = %path.display(), fingerprint = %fingerprint(&key), "Host key loaded");
        key
    } else {
        let key = generate_host_key()?;
        save_host_key(&key, path)?;
        info!(path = %path.display(), fingerprint = %fingerprint(&key), "Host key generated");
        key
    };
    Ok(key)
}

/// SHA-256 fingerprint of the public half, OpenSSH style.
pub fn fingerprint(key: &PrivateKey) -> String {
    key.public_key().fingerprint(HashAlg::Sha256).to_string()
}

fn load_host_key(path: &Path) -> Result<PrivateKey> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("reading host key: {}", path.display()))?;
    russh::keys::decode_secret_key(&pem, None)
        .map_err(|e| anyhow::anyhow!("decoding host key {}: {}", path.display(), e))
}

fn generate_host_key() -> Result<PrivateKey> {
    PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)
        .map_err(|e| anyhow::anyhow!("Ed25519 key generation failed: {}", e))
}

fn save_host_key(key: &PrivateKey, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory: {}", parent.display()))?;
        }
    }

    let mut pem = Vec::new();
    russh::keys::encode_pkcs8_pem(key, &mut pem)
        .map_err(|e| anyhow::anyhow!("encoding host key: {}", e))?;

    // Created 0600 so the key is never readable by others, even briefly
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)
            .with_context(|| format!("creating host key file: {}", path.display()))?;
        file.write_all(&pem)
            .with_context(|| format!("writing host key: {}", path.display()))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, &pem)
            .with_context(|| format!("writing host key: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(unix)]
fn warn_if_world_readable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "Host key is accessible by group/other, consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_world_readable(_path: &Path) {}
