use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use gatewarden_common::claims::responsibility_hash;
use gatewarden_common::ErrorKind;
use time::OffsetDateTime;
use tracing::debug;

use crate::context::RequestContext;
use crate::entity::Tenant;
use crate::error::GateError;
use crate::AppCtx;

/// Refresh when less than this much validity remains (spec §4.I step 3).
const REFRESH_FLOOR: time::Duration = time::Duration::hours(2);

/// `GET /interceptor` (spec §4.I): the ForwardAuth gate a reverse proxy
/// consults on every request.
pub async fn interceptor(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.clone().ok_or(ErrorKind::NoTenant)?;

    if !tenant.interceptor.enabled {
        ctx.metrics.interceptor_failure(&tenant.name, "TENANT_NOT_ALLOWED");
        return Err(ErrorKind::TenantNotAllowed.into());
    }

    let Some(payload) = request_ctx.valid_payload().cloned() else {
        ctx.metrics.interceptor_failure(&tenant.name, "NO_VALID_PAYLOAD");
        return Ok(redirect_to_login(&tenant, &request_ctx).into_response());
    };

    let now = OffsetDateTime::now_utc();
    let remaining = time::Duration::seconds(payload.exp - now.unix_timestamp());
    let midpoint_passed = now.unix_timestamp()
        > payload.exp - (ctx.config.cookie_expiration.as_secs() as i64 * 3 / 4);

    if remaining < REFRESH_FLOOR || midpoint_passed {
        debug!(tenant = %tenant.name, "interceptor refresh window reached");
        let scripts = tenant.concatenated_scripts();
        let provider = gatewarden_script::ScriptProvider::new(scripts, ctx.config.allow_missing_providers);

        let validation = provider
            .run_validate(serde_json::json!({ "username": payload.user }))
            .await
            .map_err(|_| ErrorKind::Invalidate)?;

        if !validation.is_valid {
            ctx.metrics.interceptor_failure(&tenant.name, "INVALIDATE");
            return Ok(redirect_to_login(&tenant, &request_ctx).into_response());
        }

        let mut refreshed = payload;
        refreshed.iat = now.unix_timestamp();
        refreshed.exp = (now + ctx.config.cookie_expiration).unix_timestamp();
        refreshed.responsibility = responsibility_hash(&request_ctx.responsible_domain);

        let token = ctx
            .signer
            .sign(&refreshed, tenant.jwt_algorithm.map(Into::into))
            .map_err(|_| ErrorKind::ExpectedValueUnset)?;

        let mut cookie = Cookie::new(RequestContext::cookie_name(&ctx.app_name), token.clone());
        cookie.set_domain(
            tenant
                .interceptor
                .cookie_domain
                .clone()
                .or_else(|| tenant.interceptor.login_domain.clone())
                .unwrap_or_else(|| request_ctx.responsible_domain.clone()),
        );
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Strict);
        cookie.set_secure(ctx.config.secure);
        cookie.set_path("/");
        cookie.set_max_age(Some(ctx.config.cookie_expiration.try_into().unwrap_or(time::Duration::days(7))));

        ctx.metrics.interceptor_success(&tenant.name);
        let jar = CookieJar::new().add(cookie);
        return Ok((
            jar,
            [(header::AUTHORIZATION, format!("Bearer {token}"))],
            StatusCode::OK,
        )
            .into_response());
    }

    ctx.metrics.interceptor_success(&tenant.name);
    Ok(StatusCode::OK.into_response())
}

fn redirect_to_login(tenant: &Tenant, request_ctx: &RequestContext) -> Redirect {
    let domain = tenant
        .interceptor
        .login_domain
        .clone()
        .unwrap_or_else(|| request_ctx.responsible_domain.clone());
    let scheme = request_ctx.requested_url.scheme_str().unwrap_or("https");
    let original_url = request_ctx.requested_url.to_string();
    let target = percent_encoding::utf8_percent_encode(&original_url, crate::util::QUERY_VALUE);
    Redirect::temporary(&format!("{scheme}://{domain}/login?for={target}&mode=interceptor"))
}
