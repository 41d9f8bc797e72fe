use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Notify;

use crate::{AuthSession, CodeSessionStore, SessionKind, StoreError};

struct Entry {
    session: AuthSession,
    expires_at: Instant,
}

/// In-memory backend: a sharded map keyed by `(kind, value)` plus a
/// background reaper that sweeps expired entries. Suitable for single-node
/// deployments and tests; state does not survive a restart and is not
/// shared across a cluster.
pub struct MemoryStore {
    entries: Arc<DashMap<(SessionKind, String), Entry>>,
    shutdown: Arc<Notify>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let entries: Arc<DashMap<(SessionKind, String), Entry>> = Arc::new(DashMap::new());
        let shutdown = Arc::new(Notify::new());

        let reaper_entries = entries.clone();
        let reaper_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(30)) => {
                        let now = Instant::now();
                        reaper_entries.retain(|_, entry| entry.expires_at > now);
                    }
                    _ = reaper_shutdown.notified() => return,
                }
            }
        });

        Self { entries, shutdown }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

#[async_trait]
impl CodeSessionStore for MemoryStore {
    async fn push(
        &self,
        kind: SessionKind,
        value: &str,
        session: AuthSession,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = (kind, value.to_string());
        let new_entry = Entry {
            session,
            expires_at: Instant::now() + ttl,
        };

        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > Instant::now() {
                    return Err(StoreError::CodeTaken);
                }
                occupied.insert(new_entry);
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(new_entry);
            }
        }
        Ok(())
    }

    async fn get(
        &self,
        kind: SessionKind,
        value: &str,
        consume: bool,
    ) -> Result<Option<AuthSession>, StoreError> {
        let key = (kind, value.to_string());

        if consume {
            return Ok(self.entries.remove(&key).and_then(|(_, entry)| {
                if entry.expires_at > Instant::now() {
                    Some(entry.session)
                } else {
                    None
                }
            }));
        }

        Ok(self.entries.get(&key).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.session.clone())
            } else {
                None
            }
        }))
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn count(&self, kind: SessionKind) -> u64 {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.key().0 == kind && entry.value().expires_at > now)
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_get_consume_is_at_most_once() {
        let store = MemoryStore::new();
        let session = AuthSession::login_nonce("tenant-a");
        store
            .push(SessionKind::Code, "abc", session, Duration::from_secs(60))
            .await
            .unwrap();

        let first = store.get(SessionKind::Code, "abc", true).await.unwrap();
        assert!(first.is_some());

        let second = store.get(SessionKind::Code, "abc", true).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn push_rejects_duplicate_value() {
        let store = MemoryStore::new();
        store
            .push(
                SessionKind::Code,
                "dup",
                AuthSession::login_nonce("t"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let err = store
            .push(
                SessionKind::Code,
                "dup",
                AuthSession::login_nonce("t"),
                Duration::from_secs(60),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CodeTaken));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .push(
                SessionKind::Code,
                "short",
                AuthSession::login_nonce("t"),
                Duration::from_millis(1),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store
            .get(SessionKind::Code, "short", false)
            .await
            .unwrap()
            .is_none());
    }
}
