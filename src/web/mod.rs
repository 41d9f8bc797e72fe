//! HTTP surface (spec §6's endpoint table). Thin `axum` handlers; all
//! policy lives in `gatewarden-common`/`gatewarden-store`/`gatewarden-script`
//! and the `entity`/`context` modules.

pub mod health;
pub mod interceptor;
pub mod login;
pub mod logout;
pub mod oauth;

use axum::routing::{get, post};
use axum::Router;

use crate::AppCtx;

pub fn router(ctx: AppCtx) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/login", get(login::login_form).post(login::login_submit))
        .route("/logout", get(logout::logout).post(logout::logout))
        .route("/logout/finalize", get(logout::logout_finalize))
        .route("/authorize", get(oauth::authorize))
        .route("/token", post(oauth::token))
        .route("/token/info", get(oauth::token_info))
        .route("/interceptor", get(interceptor::interceptor))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .route("/.well-known/jwks.json", get(health::jwks))
        .route("/metrics", get(health::metrics))
        .route("/versions", get(health::versions))
        .with_state(ctx)
}
