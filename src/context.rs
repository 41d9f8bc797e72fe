use std::sync::Arc;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use gatewarden_common::TokenPayload;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::entity::{Client, Tenant};
use crate::util::base_uri::ProxiedBaseUri;
use crate::AppCtx;

/// Derived per request, never persisted (spec §3 "Request Context", §4.F).
pub struct RequestContext {
    pub requested_url: http::Uri,
    pub referer: Option<String>,
    pub responsible_domain: String,
    pub tenant: Option<Arc<Tenant>>,
    pub client: Option<Arc<Client>>,
    pub payload: Option<TokenPayload>,
    pub expired: bool,
    pub subject: Option<String>,
}

impl RequestContext {
    pub fn cookie_name(app_name: &str) -> String {
        format!("{app_name}-sso")
    }

    /// A valid (signature + expiration ok) payload, if any.
    pub fn valid_payload(&self) -> Option<&TokenPayload> {
        if self.expired {
            None
        } else {
            self.payload.as_ref()
        }
    }
}

#[derive(Deserialize, Default)]
struct ClientIdQuery {
    client_id: Option<uuid::Uuid>,
}

#[axum::async_trait]
impl FromRequestParts<AppCtx> for RequestContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppCtx) -> Result<Self, Self::Rejection> {
        let base_uri = ProxiedBaseUri::from_request_parts(parts, ctx)
            .await
            .unwrap_or_default();

        let requested_url = {
            let mut uri_parts = base_uri.0.into_parts();
            uri_parts.path_and_query = parts.uri.path_and_query().cloned();
            http::Uri::from_parts(uri_parts).unwrap_or_else(|_| parts.uri.clone())
        };

        let responsible_domain = requested_url
            .authority()
            .map(|a| a.host().to_string())
            .unwrap_or_default();

        let referer = parts
            .headers
            .get(http::header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let tenant = ctx.entity_store.lookup_tenant_by_host(&responsible_domain);

        let client_id = Query::<ClientIdQuery>::from_request_parts(parts, ctx)
            .await
            .ok()
            .and_then(|q| q.client_id);
        let client = client_id.and_then(|id| ctx.entity_store.lookup_client_by_id(id));

        let token = bearer_token(parts).or_else(|| cookie_token(parts, &ctx.app_name));

        let (payload, expired) = match token {
            None => (None, false),
            Some(token) => match ctx.signer.verify(&token) {
                Ok(payload) => {
                    let expired = payload.is_expired_at(OffsetDateTime::now_utc().unix_timestamp());
                    (Some(payload), expired)
                }
                Err(_) => (None, false),
            },
        };

        let subject = payload.as_ref().map(|p| p.sub.clone());

        Ok(Self {
            requested_url,
            referer,
            responsible_domain,
            tenant,
            client,
            payload,
            expired,
            subject,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(ToString::to_string)
}

fn cookie_token(parts: &Parts, app_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(&RequestContext::cookie_name(app_name))
        .map(|cookie| cookie.value().to_string())
}
