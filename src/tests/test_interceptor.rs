use axum::extract::State;
use time::OffsetDateTime;

use super::tenant;
use crate::test_support::{add_tenant, test_ctx};
use crate::web::interceptor::interceptor;

fn payload_for(user: &str, exp_offset: time::Duration) -> gatewarden_common::TokenPayload {
    let now = OffsetDateTime::now_utc();
    gatewarden_common::TokenPayload {
        iss: "gatewarden".to_string(),
        sub: format!("{user}-id"),
        aud: "client".to_string(),
        exp: (now + exp_offset).unix_timestamp(),
        iat: now.unix_timestamp(),
        auth_time: now.unix_timestamp(),
        tenant: "acme".to_string(),
        responsibility: gatewarden_common::claims::responsibility_hash("acme.example.com"),
        role: "member".to_string(),
        user: user.to_string(),
        scope: "openid".to_string(),
        profile: serde_json::json!({"username": user}),
    }
}

fn request_ctx_with_payload(
    ctx: &crate::AppCtx,
    payload: Option<gatewarden_common::TokenPayload>,
) -> crate::context::RequestContext {
    crate::context::RequestContext {
        requested_url: "https://acme.example.com/interceptor".parse().unwrap(),
        referer: None,
        responsible_domain: "acme.example.com".to_string(),
        tenant: ctx.entity_store.lookup_tenant_by_host("acme.example.com"),
        client: None,
        payload,
        expired: false,
        subject: None,
    }
}

/// Spec §8 scenario 4: no valid session cookie means the interceptor
/// redirects to the tenant's login domain instead of granting access.
#[tokio::test]
async fn no_session_redirects_to_login() {
    let ctx = test_ctx();
    add_tenant(&ctx, tenant("acme"));

    let rc = request_ctx_with_payload(&ctx, None);
    let response = interceptor(State(ctx), rc).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get(axum::http::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://login.example.com/login?for="));
    assert!(location.contains("mode=interceptor"));
    assert!(!location.contains("%2E"));
}

#[tokio::test]
async fn fresh_session_passes_without_refresh() {
    let ctx = test_ctx();
    add_tenant(&ctx, tenant("acme"));

    let payload = payload_for("alice", time::Duration::hours(24));
    let rc = request_ctx_with_payload(&ctx, Some(payload));

    let response = interceptor(State(ctx), rc).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// A session nearing expiry is refreshed via `user_validation_provider`,
/// which is invoked with `{username}`, not the raw stored profile.
#[tokio::test]
async fn near_expiry_session_refreshes_for_valid_user() {
    let ctx = test_ctx();
    add_tenant(&ctx, tenant("acme"));

    let payload = payload_for("alice", time::Duration::minutes(30));
    let rc = request_ctx_with_payload(&ctx, Some(payload));

    let response = interceptor(State(ctx), rc).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    assert!(response.headers().get(axum::http::header::AUTHORIZATION).is_some());
    assert!(response.headers().get(axum::http::header::SET_COOKIE).is_some());
}

/// Spec §8 scenario 5 from the interceptor's side: a user the validation
/// provider no longer recognizes is redirected to log in again rather than
/// refreshed.
#[tokio::test]
async fn near_expiry_session_for_unknown_user_redirects() {
    let ctx = test_ctx();
    add_tenant(&ctx, tenant("acme"));

    let payload = payload_for("ghost", time::Duration::minutes(30));
    let rc = request_ctx_with_payload(&ctx, Some(payload));

    let response = interceptor(State(ctx), rc).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn disabled_interceptor_is_rejected() {
    let ctx = test_ctx();
    let mut t = tenant("acme");
    t.interceptor.enabled = false;
    add_tenant(&ctx, t);

    let rc = request_ctx_with_payload(&ctx, None);
    let err = interceptor(State(ctx), rc).await.unwrap_err();
    let response = axum::response::IntoResponse::into_response(err);
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}

