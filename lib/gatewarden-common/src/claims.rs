//! The access/refresh token payload (spec §3 "Token Payload").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JWT claims issued by the [`Signer`](https://docs.rs/gatewarden-keys).
///
/// `tenant` and `responsibility` bind the token to the tenant and forwarded
/// host it was minted for; verifying these against the request context is
/// what makes the "tenant binding" invariant hold (spec §8).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub auth_time: i64,

    pub tenant: String,
    /// blake3/sha256 hash of the responsible domain this cookie is scoped to
    pub responsibility: String,
    pub role: String,
    pub user: String,
    pub scope: String,
    #[serde(default)]
    pub profile: Value,
}

impl TokenPayload {
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        now_unix >= self.exp
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split('+').filter(|s| !s.is_empty())
    }
}

/// Hash a "responsible domain" into the opaque `responsibility` claim.
pub fn responsibility_hash(domain: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hex::encode(hasher.finalize())
}
