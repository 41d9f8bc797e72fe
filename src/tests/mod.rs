//! Handler-level coverage for the OAuth2/ForwardAuth flows (spec §8),
//! driving handlers directly rather than over a bound TCP listener.

mod test_interceptor;
mod test_script_provider;
mod test_signer;

use uuid::Uuid;

use crate::entity::client::GrantType;
use crate::entity::tenant::InterceptorConfig;
use crate::entity::{Client, Tenant};

pub(super) const ALICE_LOGIN_SCRIPT: &str = r#"
    fn user_login_provider(credentials) {
        if credentials["username"] == "alice" && credentials["password"] == "hunter2" {
            commit(#{ "subject": "alice-id" });
            #{ "can_login": true, "user_profile": #{ "username": "alice" }, "role": "member", "scopes": ["openid"] }
        } else {
            #{ "can_login": false, "user_profile": #{}, "role": "", "scopes": [] }
        }
    }
    fn user_validation_provider(user) {
        #{ "is_valid": user["username"] == "alice" }
    }
"#;

pub(super) fn tenant(name: &str) -> Tenant {
    Tenant {
        name: name.to_string(),
        host_patterns: vec![format!("{name}.example.com")],
        interceptor: InterceptorConfig {
            enabled: true,
            login_domain: Some("login.example.com".to_string()),
            cookie_domain: None,
        },
        provider_scripts: vec![ALICE_LOGIN_SCRIPT.to_string()],
        jwt_algorithm: None,
        silent_login: true,
        info_urls: vec![],
    }
}

/// Builds a `RequestContext` the way the `FromRequestParts` impl would,
/// without going through an actual HTTP request.
pub(super) fn request_ctx(
    ctx: &crate::AppCtx,
    host: &str,
    path: &str,
    client_id: Option<Uuid>,
) -> crate::context::RequestContext {
    crate::context::RequestContext {
        requested_url: format!("https://{host}{path}").parse().unwrap(),
        referer: None,
        responsible_domain: host.to_string(),
        tenant: ctx.entity_store.lookup_tenant_by_host(host),
        client: client_id.and_then(|id| ctx.entity_store.lookup_client_by_id(id)),
        payload: None,
        expired: false,
        subject: None,
    }
}

pub(super) fn client(tenant_name: &str, redirect: &str) -> Client {
    Client {
        ident: Uuid::new_v4(),
        name: "demo-client".to_string(),
        tenant: tenant_name.to_string(),
        redirect_uris: vec![redirect.to_string()],
        scopes_whitelist: None,
        referrer_whitelist: None,
        grant_types: [GrantType::AuthorizationCode, GrantType::RefreshToken].into_iter().collect(),
        pkce_only: false,
        secret: None,
        allowed_provider_scopes: None,
    }
}
