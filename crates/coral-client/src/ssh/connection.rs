//! SSH connection to the array CLI service
//!
//! One authenticated russh client session per pool slot. The transport
//! keep-alive interval is set so connections that idle in the pool remain
//! valid between commands.

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Config, Handle, Msg};
use russh::Channel;
use russh_keys::key::PublicKey;

use coral_core::config::{MissingKeyPolicy, SshConfig};
use coral_core::ClientError;

/// An authenticated SSH transport to one array
pub struct SshConnection {
    handle: Handle<ClientHandler>,
}

impl SshConnection {
    /// Dial and authenticate a new connection
    pub async fn connect(config: &SshConfig) -> Result<Self, ClientError> {
        let ssh_config = Arc::new(Config {
            keepalive_interval: Some(config.keepalive_interval),
            ..Config::default()
        });

        let handler = ClientHandler {
            policy: config.missing_key_policy,
            known_hosts_file: config.known_hosts_file.clone(),
            host: config.ip.clone(),
            port: config.port,
        };

        let address = config.address();
        tracing::debug!(address = %address, "connecting to array CLI");

        let mut handle = tokio::time::timeout(
            config.conn_timeout,
            client::connect(ssh_config, &address, handler),
        )
        .await
        .map_err(|_| {
            ClientError::ConnectionError(format!("connection to {address} timed out"))
        })?
        .map_err(|e| ClientError::ConnectionError(format!("failed to connect to {address}: {e}")))?;

        let authenticated = if let Some(key_path) = &config.private_key_path {
            let key = russh_keys::load_secret_key(key_path, None).map_err(|e| {
                ClientError::SshException(format!(
                    "failed to load private key {}: {e}",
                    key_path.display()
                ))
            })?;
            handle
                .authenticate_publickey(&config.login, Arc::new(key))
                .await
                .map_err(|e| ClientError::SshException(format!("authentication error: {e}")))?
        } else if let Some(password) = &config.password {
            handle
                .authenticate_password(&config.login, password)
                .await
                .map_err(|e| ClientError::SshException(format!("authentication error: {e}")))?
        } else {
            return Err(ClientError::SshException(
                "no password or private key configured".to_string(),
            ));
        };

        if !authenticated {
            return Err(ClientError::SshException(format!(
                "authentication rejected for user '{}'",
                config.login
            )));
        }

        tracing::debug!(address = %address, user = %config.login, "CLI connection established");
        Ok(Self { handle })
    }

    /// Whether the underlying transport has been torn down
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Open a session channel for one command run
    pub async fn open_session(&self) -> Result<Channel<Msg>, ClientError> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| ClientError::SshException(format!("failed to open channel: {e}")))
    }
}

/// russh handler implementing the configured host-key policy
struct ClientHandler {
    policy: MissingKeyPolicy,
    known_hosts_file: Option<std::path::PathBuf>,
    host: String,
    port: u16,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();

        match self.policy {
            MissingKeyPolicy::AutoAdd => Ok(true),
            MissingKeyPolicy::Warn => {
                tracing::warn!(
                    host = %self.host,
                    %fingerprint,
                    "accepting unverified host key"
                );
                Ok(true)
            }
            MissingKeyPolicy::Reject => {
                let Some(path) = &self.known_hosts_file else {
                    tracing::error!(
                        host = %self.host,
                        "host-key policy is reject but no known-hosts file is configured"
                    );
                    return Ok(false);
                };
                match russh_keys::check_known_hosts_path(
                    &self.host,
                    self.port,
                    server_public_key,
                    path,
                ) {
                    Ok(true) => Ok(true),
                    Ok(false) => {
                        tracing::error!(
                            host = %self.host,
                            %fingerprint,
                            "host key not present in {}",
                            path.display()
                        );
                        Ok(false)
                    }
                    Err(e) => {
                        tracing::error!(
                            host = %self.host,
                            %fingerprint,
                            "host key verification failed: {e}"
                        );
                        Ok(false)
                    }
                }
            }
        }
    }
}
