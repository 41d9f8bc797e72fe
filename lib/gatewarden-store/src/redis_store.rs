use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use tracing::warn;

use crate::{AuthSession, CodeSessionStore, SessionKind, StoreError};

const KEY_PREFIX: &str = "gatewarden";

/// Redis backend: one key per session (`gatewarden:{kind}:{value}`), value
/// is the session JSON-encoded, expiration delegated to `PX`. `get(...,
/// consume = true)` uses `GETDEL` so consumption is atomic server-side --
/// the store itself, not this client, is the single synchronization point
/// (spec §5).
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { manager })
    }

    fn key(kind: SessionKind, value: &str) -> String {
        format!("{KEY_PREFIX}:{kind}:{value}")
    }

    fn scan_pattern(kind: SessionKind) -> String {
        format!("{KEY_PREFIX}:{kind}:*")
    }
}

#[async_trait]
impl CodeSessionStore for RedisStore {
    async fn push(
        &self,
        kind: SessionKind,
        value: &str,
        session: AuthSession,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(&session)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let mut conn = self.manager.clone();

        let set: Option<String> = redis::cmd("SET")
            .arg(Self::key(kind, value))
            .arg(payload)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        match set {
            Some(_) => Ok(()),
            None => Err(StoreError::CodeTaken),
        }
    }

    async fn get(
        &self,
        kind: SessionKind,
        value: &str,
        consume: bool,
    ) -> Result<Option<AuthSession>, StoreError> {
        let mut conn = self.manager.clone();
        let key = Self::key(kind, value);

        let raw: Option<Vec<u8>> = if consume {
            redis::cmd("GETDEL")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|err| StoreError::Unavailable(err.to_string()))?
        } else {
            conn.get(&key)
                .await
                .map_err(|err| StoreError::Unavailable(err.to_string()))?
        };

        raw.map(|bytes| {
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Unavailable(err.to_string()))
        })
        .transpose()
    }

    async fn is_healthy(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(_) => true,
            Err(err) => {
                warn!(?err, "redis health check failed");
                false
            }
        }
    }

    async fn count(&self, kind: SessionKind) -> u64 {
        let mut conn = self.manager.clone();
        let pattern = Self::scan_pattern(kind);

        let mut total = 0u64;
        let mut cursor = 0u64;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = match redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
            {
                Ok(result) => result,
                Err(err) => {
                    warn!(?err, "redis scan failed, returning approximate count");
                    return total;
                }
            };
            total += keys.len() as u64;
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        total
    }
}
