use gatewarden_common::{pkce::PkceChallenge, TokenPayload};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Code,
    Refresh,
    LoginNonce,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Refresh => "refresh",
            Self::LoginNonce => "login-nonce",
        };
        f.write_str(s)
    }
}

/// A stored auth session, captured at `/authorize` or `/login` time and
/// redeemed at `/token` or `GET /authorize?loginid=...` (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub client_id: Option<Uuid>,
    pub tenant: String,
    pub scopes: Vec<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub pkce: Option<PkceChallenge>,
    /// The verified payload captured when the session was created; present
    /// for `code`/`refresh`, absent for a plain `login-nonce`.
    pub payload: Option<TokenPayload>,
}

impl AuthSession {
    pub fn login_nonce(tenant: impl Into<String>) -> Self {
        Self {
            client_id: None,
            tenant: tenant.into(),
            scopes: Vec::new(),
            redirect_uri: None,
            state: None,
            pkce: None,
            payload: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("value already exists for this kind")]
    CodeTaken,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
