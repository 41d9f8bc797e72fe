use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatewarden_common::ErrorKind;
use serde_json::json;
use tracing::warn;

/// The HTTP-facing error type (spec §7). Wraps [`ErrorKind`], which carries
/// no HTTP dependency of its own, so `gatewarden-common` stays framework-agnostic.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("{0}")]
pub struct GateError(pub ErrorKind);

impl From<ErrorKind> for GateError {
    fn from(kind: ErrorKind) -> Self {
        Self(kind)
    }
}

/// Maps a failed `run_login`/`run_validate` call onto an [`ErrorKind`]. A
/// missing provider or a script that doesn't even compile is a tenant
/// misconfiguration (spec §4.E), not a credential mistake, so it must not
/// surface as `WRONG_CREDENTIALS`.
pub fn script_error_kind(err: &gatewarden_script::ScriptError) -> ErrorKind {
    use gatewarden_script::ScriptError;

    match err {
        ScriptError::MissingLoginProvider
        | ScriptError::MissingValidationProvider
        | ScriptError::Compile(_)
        | ScriptError::Timeout(_)
        | ScriptError::Runtime(_)
        | ScriptError::MalformedResult(_) => ErrorKind::ProviderUnavailable,
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
        let reason = self.0.reason_key();

        warn!(%reason, %status, "request failed");

        let body = Json(json!({
            "status": status.as_u16(),
            "error": true,
            "reason": reason,
        }));

        (status, body).into_response()
    }
}
