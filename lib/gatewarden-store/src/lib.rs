//! Pluggable Code/Session Store (spec §4.D).
//!
//! Holds auth codes, refresh tokens and login nonces behind one trait with
//! two backends: an in-memory map for single-node/dev deployments, and
//! Redis for clustered ones. Both honor the same at-most-once consumption
//! and TTL semantics so callers never need to know which is active.

mod memory;
mod random;
mod redis_store;
mod types;

pub use memory::MemoryStore;
pub use random::{generate_code_value, generate_login_nonce};
pub use redis_store::RedisStore;
pub use types::{AuthSession, SessionKind, StoreError};

use async_trait::async_trait;
use std::time::Duration;

/// Common API implemented by every backend (spec §4.D).
#[async_trait]
pub trait CodeSessionStore: Send + Sync {
    /// Insert a brand-new session. Fails with [`StoreError::CodeTaken`] if
    /// `value` already exists for `kind` -- the alphabet is wide enough
    /// (CSPRNG, `[A-Za-z0-9]`, length >= 32) that this should never happen
    /// organically, but a client-supplied value must still be rejected.
    async fn push(
        &self,
        kind: SessionKind,
        value: &str,
        session: AuthSession,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Look up a session. When `consume` is `true` the entry is atomically
    /// removed before this call returns -- a second concurrent `get` with
    /// `consume = true` for the same `value` must see `None`.
    async fn get(
        &self,
        kind: SessionKind,
        value: &str,
        consume: bool,
    ) -> Result<Option<AuthSession>, StoreError>;

    /// Best-effort liveness probe. Memory backend is always healthy; Redis
    /// round-trips a `PING`.
    async fn is_healthy(&self) -> bool;

    /// Approximate count of live entries of `kind`, for metrics only.
    async fn count(&self, kind: SessionKind) -> u64;
}
