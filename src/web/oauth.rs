use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use gatewarden_common::{pkce, ErrorKind};
use gatewarden_store::{AuthSession, SessionKind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::entity::client::GrantType;
use crate::error::GateError;
use crate::AppCtx;

const AUTHCODE_TTL: Duration = Duration::from_secs(10 * 60);
const CODE_VALUE_MIN_LEN: usize = 32;

#[derive(Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: String,
    pub client_id: Uuid,
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub loginid: Option<String>,
}

/// `GET /authorize` (spec §4.G).
pub async fn authorize(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.ok_or(ErrorKind::NoTenant)?;
    let client = ctx
        .entity_store
        .lookup_client_by_id(query.client_id)
        .ok_or(ErrorKind::NoClient)?;

    ctx.metrics.authorize_attempt(&tenant.name, &client.name);

    if query.response_type != "code" {
        return Err(ErrorKind::NotAcceptableRequest.into());
    }

    let pkce_challenge = match (&query.code_challenge, &query.code_challenge_method) {
        (Some(challenge), Some(method)) => {
            let method = pkce::ChallengeMethod::parse(method)
                .ok_or(ErrorKind::CodeChallengeMethodMismatch)?;
            Some(pkce::PkceChallenge {
                challenge: challenge.clone(),
                method,
            })
        }
        (None, None) => None,
        _ => return Err(ErrorKind::NotAcceptableRequest.into()),
    };

    if client.pkce_only && pkce_challenge.is_none() {
        return Err(ErrorKind::ClientOnlySupportsPkce.into());
    }

    let mut verified_payload = None;

    if let Some(loginid) = &query.loginid {
        // The nonce itself carries no payload; it only proves this request
        // follows a just-completed `/login` round trip (spec §4.H step 2).
        // The actual payload comes from the cookie `/login` just set.
        ctx.code_store
            .get(SessionKind::LoginNonce, loginid, true)
            .await
            .map_err(|_| ErrorKind::CodeStorageAvailability)?
            .ok_or(ErrorKind::BadLoginId)?;
        verified_payload = request_ctx.valid_payload().cloned();
    } else {
        if let Some(whitelist) = &client.referrer_whitelist {
            let referer = request_ctx.referer.as_deref().unwrap_or_default();
            if !whitelist.is_empty() && !client.matches_referrer(referer) {
                return Err(ErrorKind::WrongReferer.into());
            }
        }

        if tenant.silent_login {
            verified_payload = request_ctx.valid_payload().cloned();
        }
    }

    let Some(payload) = verified_payload else {
        return Ok(Redirect::to(&format!(
            "/login?for={}&mode=oauth",
            percent_encoding::utf8_percent_encode(&original_authorize_url(&query), crate::util::QUERY_VALUE)
        ))
        .into_response());
    };

    if !client.matches_redirect_uri(&query.redirect_uri) {
        return Err(ErrorKind::RedirectMismatch.into());
    }

    let scopes = client.filter_scopes(query.scope.split('+').filter(|s| !s.is_empty()));

    let code = gatewarden_store::generate_code_value();
    debug_assert!(code.len() >= CODE_VALUE_MIN_LEN);

    ctx.code_store
        .push(
            SessionKind::Code,
            &code,
            AuthSession {
                client_id: Some(client.ident),
                tenant: tenant.name.clone(),
                scopes,
                redirect_uri: Some(query.redirect_uri.clone()),
                state: query.state.clone(),
                pkce: pkce_challenge,
                payload: Some(payload),
            },
            AUTHCODE_TTL,
        )
        .await
        .map_err(|_| ErrorKind::CodeStorageAvailability)?;

    let mut target = format!("{}?code={code}", query.redirect_uri);
    if let Some(state) = &query.state {
        target.push_str(&format!("&state={state}"));
    }

    Ok(Redirect::to(&target).into_response())
}

fn original_authorize_url(query: &AuthorizeQuery) -> String {
    let mut url = format!(
        "/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}",
        query.client_id, query.redirect_uri, query.scope
    );
    if let Some(state) = &query.state {
        url.push_str(&format!("&state={state}"));
    }
    if let Some(challenge) = &query.code_challenge {
        url.push_str(&format!("&code_challenge={challenge}"));
    }
    if let Some(method) = &query.code_challenge_method {
        url.push_str(&format!("&code_challenge_method={method}"));
    }
    url
}

#[derive(Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub client_id: Uuid,
    pub client_secret: Option<String>,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

/// `POST /token` (spec §4.G).
pub async fn token(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
    axum::Form(form): axum::Form<TokenForm>,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.ok_or(ErrorKind::NoTenant)?;
    let client = ctx
        .entity_store
        .lookup_client_by_id(form.client_id)
        .ok_or(ErrorKind::NoClient)?;

    if !client.check_secret(form.client_secret.as_deref()) {
        ctx.metrics.oauth_failure(&tenant.name, &client.name, "WRONG_CLIENT_SECRET");
        return Err(ErrorKind::WrongClientSecret.into());
    }

    let grant: GrantType = form
        .grant_type
        .parse()
        .map_err(|_| ErrorKind::UnsupportedGrantType)?;
    if !client.allows_grant(grant) {
        ctx.metrics.oauth_failure(&tenant.name, &client.name, "UNSUPPORTED_GRANT_TYPE");
        return Err(ErrorKind::UnsupportedGrantType.into());
    }

    match grant {
        GrantType::AuthorizationCode => authorization_code_grant(&ctx, &tenant.name, &client, form).await,
        GrantType::RefreshToken => refresh_token_grant(&ctx, &tenant.name, &client, form).await,
        GrantType::Password => password_grant(&ctx, &tenant.name, &client, form).await,
    }
}

async fn authorization_code_grant(
    ctx: &AppCtx,
    tenant_name: &str,
    client: &crate::entity::Client,
    form: TokenForm,
) -> Result<Response, GateError> {
    let code = form.code.as_deref().ok_or(ErrorKind::InvalidCode)?;
    let session = ctx
        .code_store
        .get(SessionKind::Code, code, true)
        .await
        .map_err(|_| ErrorKind::CodeStorageAvailability)?
        .ok_or(ErrorKind::InvalidCode)?;

    match (&session.pkce, &form.code_verifier) {
        (Some(challenge), Some(verifier)) => {
            if !pkce::is_valid_verifier(verifier) || !pkce::verify(challenge, verifier) {
                return Err(ErrorKind::CodeChallengeMethodMismatch.into());
            }
        }
        (None, None) => {}
        _ => return Err(ErrorKind::CodeChallengeMethodMismatch.into()),
    }

    let payload = session.payload.ok_or(ErrorKind::ExpectedValueUnset)?;
    if payload.tenant != tenant_name {
        return Err(ErrorKind::TenantMismatch.into());
    }

    issue_tokens(ctx, tenant_name, client, payload, session.scopes, true).await
}

async fn refresh_token_grant(
    ctx: &AppCtx,
    tenant_name: &str,
    client: &crate::entity::Client,
    form: TokenForm,
) -> Result<Response, GateError> {
    let refresh_token = form.refresh_token.as_deref().ok_or(ErrorKind::InvalidToken)?;
    let session = ctx
        .code_store
        .get(SessionKind::Refresh, refresh_token, true)
        .await
        .map_err(|_| ErrorKind::CodeStorageAvailability)?
        .ok_or(ErrorKind::InvalidToken)?;

    let payload = session.payload.ok_or(ErrorKind::ExpectedValueUnset)?;
    if payload.tenant != tenant_name {
        return Err(ErrorKind::TenantMismatch.into());
    }

    let provider = tenant_script_provider(ctx, tenant_name)?;
    let outcome = provider
        .run_validate(serde_json::json!({ "username": payload.user }))
        .await
        .map_err(|_| ErrorKind::Invalidate)?;

    if !outcome.is_valid {
        return Err(ErrorKind::Invalidate.into());
    }

    issue_tokens(ctx, tenant_name, client, payload, session.scopes, true).await
}

async fn password_grant(
    ctx: &AppCtx,
    tenant_name: &str,
    client: &crate::entity::Client,
    form: TokenForm,
) -> Result<Response, GateError> {
    let username = form.username.ok_or(ErrorKind::WrongCredentials)?;
    let password = form.password.ok_or(ErrorKind::WrongCredentials)?;

    let provider = tenant_script_provider(ctx, tenant_name)?;
    let outcome = provider
        .run_login(username.clone(), password)
        .await
        .map_err(|err| crate::error::script_error_kind(&err))?;

    if !outcome.can_login {
        return Err(ErrorKind::WrongCredentials.into());
    }

    let scopes = client.filter_provider_scopes(&outcome.scopes);
    let payload = gatewarden_common::TokenPayload {
        iss: ctx.config.public_domain.clone(),
        sub: outcome.subject.unwrap_or(username),
        aud: client.ident.to_string(),
        exp: (OffsetDateTime::now_utc() + ctx.config.token_expiration).unix_timestamp(),
        iat: OffsetDateTime::now_utc().unix_timestamp(),
        auth_time: OffsetDateTime::now_utc().unix_timestamp(),
        tenant: tenant_name.to_string(),
        responsibility: gatewarden_common::claims::responsibility_hash(tenant_name),
        role: outcome.role,
        user: outcome.user_profile.get("username").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        scope: scopes.join("+"),
        profile: outcome.user_profile,
    };

    // no refresh token is issued for the legacy password grant (spec §4.G step 3).
    issue_tokens(ctx, tenant_name, client, payload, scopes, false).await
}

async fn issue_tokens(
    ctx: &AppCtx,
    tenant_name: &str,
    client: &crate::entity::Client,
    mut payload: gatewarden_common::TokenPayload,
    scopes: Vec<String>,
    issue_refresh: bool,
) -> Result<Response, GateError> {
    let now = OffsetDateTime::now_utc();
    payload.iat = now.unix_timestamp();
    payload.exp = (now + ctx.config.token_expiration).unix_timestamp();
    payload.scope = scopes.join("+");

    let access_token = ctx
        .signer
        .sign(&payload, None)
        .map_err(|_| ErrorKind::ExpectedValueUnset)?;

    let refresh_token = if issue_refresh {
        let refresh_value = gatewarden_store::generate_code_value();
        ctx.code_store
            .push(
                SessionKind::Refresh,
                &refresh_value,
                AuthSession {
                    client_id: Some(client.ident),
                    tenant: tenant_name.to_string(),
                    scopes: scopes.clone(),
                    redirect_uri: None,
                    state: None,
                    pkce: None,
                    payload: Some(payload.clone()),
                },
                ctx.config.token_refresh_expiration,
            )
            .await
            .map_err(|_| ErrorKind::CodeStorageAvailability)?;
        Some(refresh_value)
    } else {
        None
    };

    ctx.metrics.oauth_success(tenant_name, &client.name);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ctx.config.token_expiration.as_secs(),
        refresh_token,
        scope: scopes.join("+"),
    })
    .into_response())
}

/// `GET /token/info` (spec §4.G).
pub async fn token_info(request_ctx: RequestContext) -> Result<Response, GateError> {
    let payload = request_ctx.valid_payload().ok_or(ErrorKind::InvalidToken)?;
    Ok(Json(payload.profile.clone()).into_response())
}

fn tenant_script_provider(
    ctx: &AppCtx,
    tenant_name: &str,
) -> Result<gatewarden_script::ScriptProvider, ErrorKind> {
    let tenant = ctx
        .entity_store
        .lookup_tenant_by_name(tenant_name)
        .ok_or(ErrorKind::NoTenant)?;

    Ok(gatewarden_script::ScriptProvider::new(
        tenant.concatenated_scripts(),
        ctx.config.allow_missing_providers,
    ))
}
