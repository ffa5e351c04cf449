//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use russh::client;
use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::{HashAlg, PublicKey};
use tracing::{debug, info};

use super::error::SshError;
use crate::config::DeviceConfig;
use crate::sftp::{SftpError, SftpSession};

/// Connection timeout for the initial handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// SSH client for a configured device
pub struct SshClient {
    config: DeviceConfig,
}

impl SshClient {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Connect to the SSH server and return an authenticated session
    pub async fn connect(self) -> Result<SshSession, SshError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!("Connecting to SSH server at {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let handler = ClientHandler::new(self.config.host.clone(), self.config.port);

        let mut handle = tokio::time::timeout(
            CONNECT_TIMEOUT,
            client::connect(Arc::new(ssh_config), socket_addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout("Connection timed out".to_string()))?
        .map_err(|e| SshError::ConnectionFailed(e.to_string()))?;

        debug!("SSH handshake completed");

        let authenticated = if let Some(key_path) = &self.config.key_file {
            let expanded = expand_tilde(key_path);
            let key = russh::keys::load_secret_key(&expanded, None)
                .map_err(|e| SshError::KeyError(e.to_string()))?;
            let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key), None);

            handle
                .authenticate_publickey(&self.config.username, key_with_hash)
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
        } else {
            let password = self.config.password.as_deref().unwrap_or("");
            handle
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
        };

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful");

        Ok(SshSession { handle })
    }
}

/// An authenticated SSH connection
pub struct SshSession {
    handle: client::Handle<ClientHandler>,
}

impl SshSession {
    /// Open the SFTP subsystem on a fresh channel
    pub async fn open_sftp(&self) -> Result<SftpSession, SftpError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SftpError::ChannelError(e.to_string()))?;

        channel.request_subsystem(true, "sftp").await.map_err(|e| {
            SftpError::SubsystemNotAvailable(format!("Failed to request SFTP subsystem: {}", e))
        })?;

        SftpSession::new(channel.into_stream()).await
    }

    /// Disconnect from the server
    pub async fn disconnect(&self) -> Result<(), SshError> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(SshError::from)
    }
}

/// Client handler for russh callbacks.
///
/// Host keys are accepted on first use; the fingerprint is logged so the user
/// can verify it out of band.
pub struct ClientHandler {
    host: String,
    port: u16,
}

impl ClientHandler {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256);
        info!(
            "Accepting host key for {}:{} (fingerprint: {})",
            self.host, self.port, fingerprint
        );
        Ok(true)
    }
}

/// Expand a `~/` prefix to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
