use axum::extract::{Query, State};

use super::{tenant, ALICE_LOGIN_SCRIPT};
use crate::test_support::{add_tenant, test_ctx};
use crate::web::login::{login_submit, LoginMode, LoginQuery};

fn login_form(username: &str, password: &str) -> crate::web::login::LoginForm {
    crate::web::login::LoginForm {
        username: username.to_string(),
        password: password.to_string(),
        location: "https://acme.example.com/cb".to_string(),
        scope: String::new(),
    }
}

fn request_ctx(ctx: &crate::AppCtx) -> crate::context::RequestContext {
    crate::context::RequestContext {
        requested_url: "https://acme.example.com/login".parse().unwrap(),
        referer: None,
        responsible_domain: "acme.example.com".to_string(),
        tenant: ctx.entity_store.lookup_tenant_by_host("acme.example.com"),
        client: None,
        payload: None,
        expired: false,
        subject: None,
    }
}

#[tokio::test]
async fn correct_credentials_reach_redirect() {
    let ctx = test_ctx();
    add_tenant(&ctx, tenant("acme"));

    let query = Query(LoginQuery {
        target: "https://acme.example.com/cb".to_string(),
        mode: LoginMode::Oauth,
    });
    let rc = request_ctx(&ctx);
    let form = axum::Form(login_form("alice", "hunter2"));

    let response = login_submit(State(ctx), rc, query, form).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
}

/// A tenant whose scripts define no `user_login_provider` at all is a
/// configuration error, not a credential mistake: it must not present as
/// `WRONG_CREDENTIALS` (spec §4.E).
#[tokio::test]
async fn missing_login_provider_is_a_server_error_not_wrong_credentials() {
    let ctx = test_ctx();
    let mut t = tenant("acme");
    t.provider_scripts = vec!["fn unrelated_function() { 1 }".to_string()];
    add_tenant(&ctx, t);

    let query = Query(LoginQuery {
        target: "https://acme.example.com/cb".to_string(),
        mode: LoginMode::Oauth,
    });
    let rc = request_ctx(&ctx);
    let form = axum::Form(login_form("alice", "hunter2"));

    let err = login_submit(State(ctx), rc, query, form).await.unwrap_err();
    let response = axum::response::IntoResponse::into_response(err);
    assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}

/// A script that fails to compile is also a configuration error, distinct
/// from a user simply typing the wrong password.
#[tokio::test]
async fn script_compile_error_is_a_server_error() {
    let ctx = test_ctx();
    let mut t = tenant("acme");
    t.provider_scripts = vec!["fn user_login_provider(credentials {".to_string()];
    add_tenant(&ctx, t);

    let query = Query(LoginQuery {
        target: "https://acme.example.com/cb".to_string(),
        mode: LoginMode::Oauth,
    });
    let rc = request_ctx(&ctx);
    let form = axum::Form(login_form("alice", "hunter2"));

    let err = login_submit(State(ctx), rc, query, form).await.unwrap_err();
    let response = axum::response::IntoResponse::into_response(err);
    assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn fixture_script_defines_both_providers() {
    assert!(ALICE_LOGIN_SCRIPT.contains("user_login_provider"));
    assert!(ALICE_LOGIN_SCRIPT.contains("user_validation_provider"));
}
