use std::collections::HashSet;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered OAuth2 client as loaded from `Configurations/Clients/*.yaml` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub ident: Uuid,
    pub name: String,
    pub tenant: String,

    /// Wildcard-capable redirect URI patterns; non-empty.
    pub redirect_uris: Vec<String>,

    #[serde(default)]
    pub scopes_whitelist: Option<HashSet<String>>,

    #[serde(default)]
    pub referrer_whitelist: Option<Vec<String>>,

    #[serde(default = "default_grant_types")]
    pub grant_types: HashSet<GrantType>,

    #[serde(default)]
    pub pkce_only: bool,

    #[serde(default)]
    #[serde(skip_serializing)]
    pub secret: Option<SecretString>,

    #[serde(default)]
    pub allowed_provider_scopes: Option<HashSet<String>>,
}

fn default_grant_types() -> HashSet<GrantType> {
    [GrantType::AuthorizationCode, GrantType::RefreshToken]
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
    Password,
}

impl Client {
    pub fn allows_grant(&self, grant: GrantType) -> bool {
        self.grant_types.contains(&grant)
    }

    /// Validates a redirect URI against the client's patterns. Supports a
    /// single trailing `*` wildcard per pattern.
    pub fn matches_redirect_uri(&self, candidate: &str) -> bool {
        self.redirect_uris
            .iter()
            .any(|pattern| matches_wildcard(pattern, candidate))
    }

    pub fn matches_referrer(&self, referrer: &str) -> bool {
        match &self.referrer_whitelist {
            None => true,
            Some(list) => list.iter().any(|pattern| matches_wildcard(pattern, referrer)),
        }
    }

    /// Intersects requested scopes with the client's whitelist; empty result allowed.
    pub fn filter_scopes<'a>(&self, requested: impl Iterator<Item = &'a str>) -> Vec<String> {
        match &self.scopes_whitelist {
            None => requested.map(ToString::to_string).collect(),
            Some(allowed) => requested
                .filter(|scope| allowed.contains(*scope))
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Filters provider-declared scopes against `allowedProviderScopes` (spec §4.H step 4).
    pub fn filter_provider_scopes(&self, declared: &[String]) -> Vec<String> {
        match &self.allowed_provider_scopes {
            None => declared.to_vec(),
            Some(allowed) => declared
                .iter()
                .filter(|scope| allowed.contains(*scope))
                .cloned()
                .collect(),
        }
    }

    pub fn check_secret(&self, provided: Option<&str>) -> bool {
        use secrecy::ExposeSecret;
        match (&self.secret, provided) {
            (None, _) => true,
            (Some(expected), Some(provided)) => expected.expose_secret() == provided,
            (Some(_), None) => false,
        }
    }
}

fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => candidate.starts_with(prefix),
        None => pattern == candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            ident: Uuid::nil(),
            name: "app".into(),
            tenant: "tenant".into(),
            redirect_uris: vec!["https://app.example.com/cb".into(), "https://dev.example.com/*".into()],
            scopes_whitelist: Some(["read".to_string()].into_iter().collect()),
            referrer_whitelist: None,
            grant_types: default_grant_types(),
            pkce_only: false,
            secret: None,
            allowed_provider_scopes: None,
        }
    }

    #[test]
    fn redirect_uri_wildcard_matches_prefix() {
        let c = client();
        assert!(c.matches_redirect_uri("https://app.example.com/cb"));
        assert!(c.matches_redirect_uri("https://dev.example.com/anything"));
        assert!(!c.matches_redirect_uri("https://evil.example.com/cb"));
    }

    #[test]
    fn scope_filter_intersects_whitelist() {
        let c = client();
        let filtered = c.filter_scopes(["read", "write"].into_iter());
        assert_eq!(filtered, vec!["read".to_string()]);
    }

    #[test]
    fn no_secret_always_matches() {
        let c = client();
        assert!(c.check_secret(None));
        assert!(c.check_secret(Some("whatever")));
    }
}
