//! Black-box HTTP tests against a bound listener, for the surface that
//! doesn't need tenant/client fixtures (spec §6's health/discovery endpoints).

use std::net::SocketAddr;

use gatewarden::test_support::test_ctx;

async fn spawn() -> SocketAddr {
    let ctx = test_ctx();
    let router = gatewarden::web::router(ctx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn health_reports_ok_with_memory_store() {
    let addr = spawn().await;
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn jwks_endpoint_returns_json() {
    let addr = spawn().await;
    let response = reqwest::get(format!("http://{addr}/.well-known/jwks.json")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("keys").is_some());
}

#[tokio::test]
async fn unknown_host_has_no_tenant_for_interceptor() {
    let addr = spawn().await;
    let response = reqwest::get(format!("http://{addr}/interceptor")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

/// Classic RS256 -> HS256 downgrade, driven through the real HTTP surface:
/// an attacker who knows a tenant's RSA public key signs an HS256 token
/// using the PEM bytes as the HMAC secret. `/token/info` must reject it
/// rather than accept a token "signed" under the wrong algorithm family.
#[tokio::test]
async fn alg_confusion_token_is_rejected_at_token_info() {
    let ctx = test_ctx();
    ctx.key_store.generate_and_store("k1", true).unwrap();
    let public_pem = ctx.key_store.find_public_pem("k1").unwrap();

    let claims = gatewarden_common::TokenPayload {
        iss: "gatewarden".to_string(),
        sub: "alice-id".to_string(),
        aud: "client".to_string(),
        exp: i64::MAX / 2,
        iat: 0,
        auth_time: 0,
        tenant: "acme".to_string(),
        responsibility: "hash".to_string(),
        role: "member".to_string(),
        user: "alice".to_string(),
        scope: "openid".to_string(),
        profile: serde_json::json!({"username": "alice"}),
    };

    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
    header.kid = Some("k1".to_string());
    let forged = jsonwebtoken::encode(
        &header,
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(public_pem.as_bytes()),
    )
    .unwrap();

    let router = gatewarden::web::router(ctx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/token/info"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
