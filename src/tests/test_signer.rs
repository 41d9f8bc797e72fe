use axum::extract::State;

use crate::test_support::test_ctx;
use crate::web::health::jwks;

/// Spec §8 scenario 6: the JWKS endpoint always answers 200 with a `keys`
/// array, even before any RSA key has been generated (HS256-only tenants
/// never populate it).
#[tokio::test]
async fn jwks_structure_matches_expected_shape() {
    let ctx = test_ctx();
    let response = jwks(State(ctx)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// Once an RSA key exists, the JWKS endpoint exposes it with the
/// `{kty, use, alg, kid, n, e}` shape the discovery document promises.
#[tokio::test]
async fn jwks_exposes_generated_rsa_key() {
    let ctx = test_ctx();
    ctx.key_store.generate_and_store("k1", true).unwrap();

    let response = jwks(State(ctx)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let key = &json["keys"][0];
    assert_eq!(key["kty"], "RSA");
    assert_eq!(key["alg"], "RS256");
    assert_eq!(key["kid"], "k1");
    assert!(key["n"].is_string());
    assert!(key["e"].is_string());
}

/// A Signer configured for RS256 round-trips a token through the Key
/// Store's lazily-generated active key.
#[tokio::test]
async fn rs256_signer_round_trips_via_context() {
    let ctx = test_ctx();
    let payload = gatewarden_common::TokenPayload {
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

    let token = ctx
        .signer
        .sign(&payload, Some(gatewarden_keys::Algorithm::Rs256))
        .unwrap();
    let verified = ctx.signer.verify(&token).unwrap();
    assert_eq!(verified, payload);
}
