// Redis storage backend
// Author: kelexine (https://github.com/kelexine)

use super::Storage;
use crate::error::{GitHubApiError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage shared between processes through a Redis server.
///
/// Entries expire through Redis' own `EX` handling when a TTL is set.
#[derive(Clone)]
pub struct RedisStorage {
    connection: MultiplexedConnection,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl RedisStorage {
    /// Connect to `url` and verify the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns `GitHubApiError::Configuration` when the URL is invalid or
    /// the server cannot be reached. No retry is attempted.
    pub async fn connect(url: &str, key_prefix: String, ttl: Option<Duration>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            GitHubApiError::Configuration(format!("Invalid redis URL '{}': {}", url, e))
        })?;

        let mut connection =
            tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
                .await
                .map_err(|_| {
                    GitHubApiError::Configuration(format!(
                        "Could not connect to redis: timed out after {}s",
                        CONNECT_TIMEOUT.as_secs()
                    ))
                })?
                .map_err(|e| {
                    GitHubApiError::Configuration(format!("Could not connect to redis: {}", e))
                })?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| GitHubApiError::Configuration(format!("Could not connect to redis: {}", e)))?;
        debug!("Redis answered {}", pong);

        Ok(Self {
            connection,
            key_prefix,
            ttl,
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(self.namespaced(key))
            .query_async(&mut connection)
            .await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut connection = self.connection.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.namespaced(key)).arg(value);
        if let Some(ttl) = self.ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = cmd.query_async(&mut connection).await?;
        Ok(())
    }
}
