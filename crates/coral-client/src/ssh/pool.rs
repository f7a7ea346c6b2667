//! Bounded pool of authenticated SSH transports
//!
//! A semaphore bounds the number of concurrently open connections at
//! `pool_max_size`; idle transports are kept for reuse. Dead entries are
//! discarded on checkout and replaced by a fresh dial, so callers always
//! receive a live transport.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use coral_core::config::SshConfig;
use coral_core::ClientError;

use super::connection::SshConnection;

/// Pool of connections to one array endpoint
pub struct SshPool {
    config: SshConfig,
    idle: Mutex<Vec<SshConnection>>,
    permits: Arc<Semaphore>,
}

/// A checked-out connection together with its pool slot.
///
/// Return it with [`SshPool::checkin`]; dropping it instead discards the
/// connection and frees the slot.
pub struct PooledConnection {
    /// The live transport
    pub conn: SshConnection,
    _permit: OwnedSemaphorePermit,
}

impl SshPool {
    /// Create an empty pool; connections are dialed on demand
    pub fn new(config: SshConfig) -> Self {
        let max_size = config.pool_max_size.max(1);
        Self {
            config,
            idle: Mutex::new(Vec::new()),
            permits: Arc::new(Semaphore::new(max_size)),
        }
    }

    /// Take a live connection, waiting for a slot if the pool is saturated
    pub async fn checkout(&self) -> Result<PooledConnection, ClientError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ClientError::ConnectionError("connection pool closed".to_string()))?;

        loop {
            let candidate = self.idle.lock().await.pop();
            match candidate {
                Some(conn) if !conn.is_closed() => {
                    return Ok(PooledConnection {
                        conn,
                        _permit: permit,
                    });
                }
                Some(_) => {
                    tracing::debug!("discarding dead pooled connection");
                }
                None => break,
            }
        }

        let conn = SshConnection::connect(&self.config).await?;
        Ok(PooledConnection {
            conn,
            _permit: permit,
        })
    }

    /// Return a connection to the pool; dead transports are dropped
    pub async fn checkin(&self, pooled: PooledConnection) {
        let PooledConnection { conn, _permit } = pooled;
        if conn.is_closed() {
            tracing::debug!("dropping dead connection on checkin");
            return;
        }
        self.idle.lock().await.push(conn);
    }

    /// Number of idle connections currently held
    pub async fn idle_len(&self) -> usize {
        self.idle.lock().await.len()
    }
}
