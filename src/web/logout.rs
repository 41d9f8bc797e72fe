use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use gatewarden_common::ErrorKind;
use serde::Deserialize;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::GateError;
use crate::AppCtx;

#[derive(Deserialize, Default)]
pub struct LogoutQuery {
    #[serde(rename = "for")]
    pub target: Option<String>,
}

/// `GET/POST /logout` (spec §6): clear the session cookie and redirect to
/// `/logout/finalize` (or the requested target if it's same-origin).
pub async fn logout(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
    jar: CookieJar,
    Query(query): Query<LogoutQuery>,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.clone().ok_or(ErrorKind::NoTenant)?;
    debug!(tenant = %tenant.name, subject = ?request_ctx.subject, "logout");

    let cookie_name = RequestContext::cookie_name(&ctx.app_name);
    let jar = jar.remove(cookie_name);

    let target = query.target.unwrap_or_else(|| "/logout/finalize".to_string());
    Ok((jar, Redirect::to(&target)).into_response())
}

/// `GET /logout/finalize`: plain landing page after the cookie is cleared.
pub async fn logout_finalize() -> Response {
    "logged out".into_response()
}
