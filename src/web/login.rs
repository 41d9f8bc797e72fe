use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use gatewarden_common::{claims::responsibility_hash, ErrorKind, TokenPayload};
use gatewarden_store::{AuthSession, SessionKind};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::GateError;
use crate::AppCtx;

/// Explicit state machine for `process_login` (SPEC_FULL §3), returned for testability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    AnonymousForm,
    CredentialsAccepted,
    CookieSet,
    Redirected,
    CredentialsRejected,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "for")]
    pub target: String,
    #[serde(default)]
    pub mode: LoginMode,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    #[default]
    Oauth,
    Interceptor,
}

/// `GET /login` (spec §4.H).
pub async fn login_form(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
    Query(query): Query<LoginQuery>,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.clone().ok_or(ErrorKind::NoTenant)?;

    if tenant.silent_login {
        if request_ctx.valid_payload().is_some() {
            return Ok(Redirect::to(&query.target).into_response());
        }
    }

    // Rendering the actual form is delegated to the template collaborator
    // (spec §1 non-goal); the core only needs to report the state reached.
    let _ = &ctx;
    let _state = LoginState::AnonymousForm;
    Ok(format!("login form for {}", query.target).into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub location: String,
    #[serde(default)]
    pub scope: String,
}

/// `POST /login` (spec §4.H).
pub async fn login_submit(
    State(ctx): State<AppCtx>,
    request_ctx: RequestContext,
    Query(query): Query<LoginQuery>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response, GateError> {
    let tenant = request_ctx.tenant.clone().ok_or(ErrorKind::NoTenant)?;
    debug!(state = ?LoginState::CredentialsAccepted, tenant = %tenant.name, "login attempt");
    ctx.metrics.login_attempt(&tenant.name, request_ctx.client.as_ref().map(|c| c.name.as_str()));

    if query.mode == LoginMode::Oauth {
        if let Some(client) = &request_ctx.client {
            if !client.matches_redirect_uri(&form.location) {
                return Err(ErrorKind::RedirectMismatch.into());
            }
        }
    }

    let login_nonce = gatewarden_store::generate_login_nonce();
    ctx.code_store
        .push(
            SessionKind::LoginNonce,
            &login_nonce,
            AuthSession::login_nonce(tenant.name.clone()),
            std::time::Duration::from_secs(300),
        )
        .await
        .map_err(|_| ErrorKind::CodeStorageAvailability)?;

    let annotated_target = annotate_with_loginid(&form.location, &login_nonce);

    let scripts = tenant.concatenated_scripts();
    let provider = gatewarden_script::ScriptProvider::new(scripts, ctx.config.allow_missing_providers);

    let outcome = provider
        .run_login(form.username.clone(), form.password)
        .await
        .map_err(|err| crate::error::script_error_kind(&err))?;

    if !outcome.can_login {
        debug!(state = ?LoginState::CredentialsRejected, tenant = %tenant.name, "login rejected");
        ctx.metrics.login_failure(&tenant.name, None, "WRONG_CREDENTIALS");
        return Err(ErrorKind::WrongCredentials.into());
    }

    let allowed_provider_scopes: Vec<String> = match &request_ctx.client {
        Some(client) => client.filter_provider_scopes(&outcome.scopes),
        None => outcome.scopes.clone(),
    };
    let requested: Vec<String> = form.scope.split('+').filter(|s| !s.is_empty()).map(str::to_string).collect();
    let mut scopes: Vec<String> = requested;
    for scope in allowed_provider_scopes {
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }

    let now = OffsetDateTime::now_utc();
    let payload = TokenPayload {
        iss: ctx.config.public_domain.clone(),
        sub: outcome.subject.unwrap_or_else(|| form.username.clone()),
        aud: request_ctx
            .client
            .as_ref()
            .map(|c| c.ident.to_string())
            .unwrap_or_default(),
        exp: (now + ctx.config.cookie_expiration).unix_timestamp(),
        iat: now.unix_timestamp(),
        auth_time: now.unix_timestamp(),
        tenant: tenant.name.clone(),
        responsibility: responsibility_hash(&request_ctx.responsible_domain),
        role: outcome.role,
        user: form.username,
        scope: scopes.join("+"),
        profile: outcome.user_profile,
    };

    let token = ctx
        .signer
        .sign(&payload, tenant.jwt_algorithm.map(Into::into))
        .map_err(|_| ErrorKind::ExpectedValueUnset)?;

    let cookie_domain = match query.mode {
        LoginMode::Interceptor => tenant
            .interceptor
            .cookie_domain
            .clone()
            .or_else(|| tenant.interceptor.login_domain.clone()),
        LoginMode::Oauth => None,
    }
    .unwrap_or_else(|| request_ctx.responsible_domain.clone());

    let mut cookie = Cookie::new(RequestContext::cookie_name(&ctx.app_name), token);
    cookie.set_domain(cookie_domain);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(ctx.config.secure);
    cookie.set_path("/");
    cookie.set_max_age(Some(
        time::Duration::try_from(ctx.config.cookie_expiration).unwrap_or(time::Duration::days(7)),
    ));

    debug!(state = ?LoginState::CookieSet, tenant = %tenant.name, "cookie set");
    ctx.metrics.login_success(&tenant.name, request_ctx.client.as_ref().map(|c| c.name.as_str()));

    debug!(state = ?LoginState::Redirected, target = %annotated_target, "login complete");
    let jar = CookieJar::new().add(cookie);
    Ok((jar, Redirect::to(&annotated_target)).into_response())
}

fn annotate_with_loginid(target: &str, login_nonce: &str) -> String {
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{target}{separator}loginid={login_nonce}")
}
