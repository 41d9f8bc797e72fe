#![cfg(test)]

use serde_json::json;

use super::*;

const LOGIN_SCRIPT: &str = r#"
fn user_login_provider(credentials) {
    if credentials.username == "alice" && credentials.password == "hunter2" {
        commit(#{ subject: "alice-id" });
        #{ can_login: true, user_profile: #{ name: "Alice" }, role: "member", scopes: ["read", "write"] }
    } else {
        #{ can_login: false, user_profile: #{}, role: "", scopes: [] }
    }
}

fn user_validation_provider(user) {
    #{ is_valid: user.active }
}
"#;

#[tokio::test]
async fn login_success_commits_subject_and_scopes() {
    let provider = ScriptProvider::new(LOGIN_SCRIPT, false);
    let outcome = provider
        .run_login("alice".into(), "hunter2".into())
        .await
        .unwrap();

    assert!(outcome.can_login);
    assert_eq!(outcome.subject.as_deref(), Some("alice-id"));
    assert_eq!(outcome.role, "member");
    assert_eq!(outcome.scopes, vec!["read".to_string(), "write".to_string()]);
}

#[tokio::test]
async fn login_failure_reports_can_login_false() {
    let provider = ScriptProvider::new(LOGIN_SCRIPT, false);
    let outcome = provider
        .run_login("alice".into(), "wrong".into())
        .await
        .unwrap();

    assert!(!outcome.can_login);
    assert!(outcome.subject.is_none());
}

#[tokio::test]
async fn validation_provider_round_trips_json_user() {
    let provider = ScriptProvider::new(LOGIN_SCRIPT, false);
    let outcome = provider
        .run_validate(json!({ "active": true }))
        .await
        .unwrap();
    assert!(outcome.is_valid);

    let outcome = provider
        .run_validate(json!({ "active": false }))
        .await
        .unwrap();
    assert!(!outcome.is_valid);
}

#[tokio::test]
async fn missing_login_provider_is_a_fatal_error() {
    let provider = ScriptProvider::new("fn some_other_fn() { 1 }", false);
    let err = provider
        .run_login("alice".into(), "hunter2".into())
        .await
        .unwrap_err();
    assert!(matches!(err, ScriptError::MissingLoginProvider));
}

#[tokio::test]
async fn missing_validation_provider_fails_closed_by_default() {
    let provider = ScriptProvider::new(
        r#"fn user_login_provider(c) { #{ can_login: true, user_profile: #{}, role: "member", scopes: [] } }"#,
        false,
    );
    let err = provider.run_validate(json!({})).await.unwrap_err();
    assert!(matches!(err, ScriptError::MissingValidationProvider));
}

#[tokio::test]
async fn missing_validation_provider_passes_in_relaxed_mode() {
    let provider = ScriptProvider::new(
        r#"fn user_login_provider(c) { #{ can_login: true, user_profile: #{}, role: "member", scopes: [] } }"#,
        true,
    );
    let outcome = provider.run_validate(json!({})).await.unwrap();
    assert!(outcome.is_valid);
}
