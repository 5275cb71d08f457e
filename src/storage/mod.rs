// Response cache storage backends
// Author: kelexine (https://github.com/kelexine)

mod memory;
mod redis_storage;

pub use memory::MemoryStorage;
pub use redis_storage::RedisStorage;

use crate::config::{CacheBackend, CacheConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Key/value backend behind the response cache.
///
/// Implementations must tolerate concurrent reads and writes from
/// independent clients; last writer wins. Values are opaque bytes and
/// expiry, if any, is left to the backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// Build the storage backend selected in `config`.
///
/// Returns `None` when caching is disabled. Connecting to Redis happens
/// here, so an unreachable server fails construction.
pub async fn from_config(config: &CacheConfig) -> Result<Option<Arc<dyn Storage>>> {
    match config.backend {
        CacheBackend::None => {
            info!("Response cache disabled");
            Ok(None)
        }
        CacheBackend::Memory => {
            info!("Using in-memory response cache");
            Ok(Some(Arc::new(MemoryStorage::new())))
        }
        CacheBackend::Redis => {
            let ttl = (config.ttl_seconds > 0).then(|| Duration::from_secs(config.ttl_seconds));
            let storage =
                RedisStorage::connect(&config.redis_url, config.key_prefix.clone(), ttl).await?;
            info!("Using Redis response cache at {}", config.redis_url);
            Ok(Some(Arc::new(storage)))
        }
    }
}
