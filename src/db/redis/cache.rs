use std::fmt::Display;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::{AppError, AppResult};

/// Prefix shared by every key this service writes
const KEY_NAMESPACE: &str = "savor";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Recommendation list for a rating batch against one catalog version
    Recommendations { catalog_version: u64, fingerprint: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                catalog_version,
                fingerprint,
            } => write!(f, "{}:recs:v{}:{}", KEY_NAMESPACE, catalog_version, fingerprint),
        }
    }
}

pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

enum WriterCommand {
    Store {
        key: String,
        payload: String,
        ttl_secs: u64,
    },
    /// Drain everything queued so far, then stop and acknowledge
    Stop(oneshot::Sender<usize>),
}

/// Redis-backed cache for computed recommendation lists
///
/// Reads go straight to Redis over a shared connection manager. Writes are
/// queued to a background task so storing a list never delays the response.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    writer: mpsc::UnboundedSender<WriterCommand>,
}

/// Stops the background writer once pending writes are flushed
pub struct CacheWriterHandle {
    writer: mpsc::UnboundedSender<WriterCommand>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.writer.send(WriterCommand::Stop(ack_tx)).is_err() {
            tracing::warn!("Cache writer already stopped");
            return;
        }
        match ack_rx.await {
            Ok(flushed) => tracing::info!(flushed, "Cache writer stopped"),
            Err(_) => tracing::warn!("Cache writer exited before acknowledging shutdown"),
        }
    }
}

impl Cache {
    /// Connects to Redis and spawns the write-behind task
    pub async fn connect(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (writer, commands) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(conn.clone(), commands));

        let cache = Self {
            conn,
            writer: writer.clone(),
        };
        Ok((cache, CacheWriterHandle { writer }))
    }

    /// Reads and decodes a cached value, `None` on a miss
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Internal(format!("Cached value for {} is unreadable: {}", key, e)))
        })
        .transpose()
    }

    /// Queues a value for storage without waiting for Redis
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Value not cacheable");
                return;
            }
        };

        let command = WriterCommand::Store {
            key: key.to_string(),
            payload,
            ttl_secs,
        };
        if self.writer.send(command).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}

async fn run_writer(mut conn: ConnectionManager, mut commands: mpsc::UnboundedReceiver<WriterCommand>) {
    tracing::debug!("Cache writer started");
    let mut failed = 0u64;

    while let Some(command) = commands.recv().await {
        match command {
            WriterCommand::Store {
                key,
                payload,
                ttl_secs,
            } => {
                if let Err(e) = store(&mut conn, &key, payload, ttl_secs).await {
                    failed += 1;
                    tracing::error!(error = %e, key = %key, failed, "Cache write failed");
                }
            }
            WriterCommand::Stop(ack) => {
                // Cloned Cache handles keep the channel open, so drain what is queued now
                let mut flushed = 0;
                while let Ok(WriterCommand::Store {
                    key,
                    payload,
                    ttl_secs,
                }) = commands.try_recv()
                {
                    match store(&mut conn, &key, payload, ttl_secs).await {
                        Ok(()) => flushed += 1,
                        Err(e) => tracing::error!(error = %e, key = %key, "Cache flush failed"),
                    }
                }
                let _ = ack.send(flushed);
                return;
            }
        }
    }
}

async fn store(conn: &mut ConnectionManager, key: &str, payload: String, ttl_secs: u64) -> AppResult<()> {
    if ttl_secs == 0 {
        let _: () = conn.set(key, payload).await?;
    } else {
        let _: () = conn.set_ex(key, payload, ttl_secs).await?;
    }
    Ok(())
}
