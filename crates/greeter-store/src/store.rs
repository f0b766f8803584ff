//! CounterStore: greeting counts backed by a Redis sorted set.

use std::sync::Arc;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::debug;

use greeter_core::NameCount;
use greeter_core::config::{StoreBackend, StoreConfig};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemorySortedSet;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

#[derive(Clone)]
enum Backend {
    Redis(ConnectionManager),
    Memory(Arc<Mutex<MemorySortedSet>>),
}

/// Shared handle to the counter store.
#[derive(Clone)]
pub struct CounterStore {
    backend: Backend,
    key: Arc<str>,
}

impl CounterStore {
    /// Open the backend named in `config`.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match config.backend {
            StoreBackend::Redis => Self::connect(&config.address, &config.key).await,
            StoreBackend::Memory => Ok(Self::in_memory(&config.key)),
        }
    }

    /// Connect to Redis at `address` (`host:port` or `redis://` URL).
    ///
    /// The connection is established eagerly so a bad address fails
    /// startup rather than the first request.
    pub async fn connect(address: &str, key: &str) -> StoreResult<Self> {
        let url = redis_url(address);
        let client = redis::Client::open(url.as_str()).map_err(|e| StoreError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(map_err!(Connect))?;
        debug!(%url, %key, "counter store connected");
        Ok(Self {
            backend: Backend::Redis(conn),
            key: Arc::from(key),
        })
    }

    /// Create an ephemeral in-memory store.
    pub fn in_memory(key: &str) -> Self {
        debug!(%key, "in-memory counter store opened");
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(MemorySortedSet::new()))),
            key: Arc::from(key),
        }
    }

    /// Sorted-set key holding the counts.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    /// Add one to `name`'s count. Returns the new count as the store renders it.
    pub async fn increment(&self, name: &str) -> StoreResult<String> {
        let count: String = match &self.backend {
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                conn.zincr(&*self.key, name, 1)
                    .await
                    .map_err(map_err!(Command))?
            }
            Backend::Memory(set) => set.lock().await.incr(name, 1).to_string(),
        };
        debug!(%name, %count, "name counted");
        Ok(count)
    }

    /// Every counted name, ascending by count.
    pub async fn list(&self) -> StoreResult<Vec<NameCount>> {
        match &self.backend {
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let pairs: Vec<(String, String)> = conn
                    .zrange_withscores(&*self.key, 0, -1)
                    .await
                    .map_err(map_err!(Command))?;
                Ok(pairs
                    .into_iter()
                    .map(|(name, count)| NameCount { name, count })
                    .collect())
            }
            Backend::Memory(set) => Ok(set.lock().await.range_with_scores()),
        }
    }
}

/// Normalize a bare `host:port` into a `redis://` URL.
pub fn redis_url(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{address}")
    }
}
