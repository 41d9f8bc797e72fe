use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::AppCtx;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `GET /health` (spec §4.J): 204 unless Code/Session Store unhealthy.
pub async fn health(State(ctx): State<AppCtx>) -> StatusCode {
    if ctx.code_store.is_healthy().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// `GET /health/ready` (spec §4.J): 204 once the store is initialized and healthy, else 417.
pub async fn health_ready(State(ctx): State<AppCtx>) -> StatusCode {
    if ctx.code_store.is_healthy().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::EXPECTATION_FAILED
    }
}

/// `GET /.well-known/jwks.json` (spec §4.J, §8 scenario 6).
pub async fn jwks(State(ctx): State<AppCtx>) -> Response {
    let jwks = ctx.key_store.public_jwks();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Json(jwks),
    )
        .into_response()
}

/// Named in spec §6's endpoint table, undetailed; reports the running build (SPEC_FULL §3).
pub async fn versions() -> Response {
    Json(json!({ "version": VERSION, "api": "v1" })).into_response()
}

pub async fn metrics() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub async fn root() -> Response {
    Json(json!({ "name": "gatewarden", "version": VERSION })).into_response()
}
