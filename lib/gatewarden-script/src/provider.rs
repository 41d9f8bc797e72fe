use std::sync::{Arc, Mutex};
use std::time::Duration;

use rhai::{Engine, Scope, AST};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ScriptError;
use crate::host::{self, CommitLog};

const RUN_BUDGET: Duration = Duration::from_secs(30);

/// Outcome of running `user_login_provider(credentials)`.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub can_login: bool,
    pub subject: Option<String>,
    pub user_profile: Value,
    pub role: String,
    pub scopes: Vec<String>,
}

/// Outcome of running `user_validation_provider(user)`.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub is_valid: bool,
}

/// Compiles and runs a tenant's concatenated provider scripts. One instance
/// per request; never reused across requests (spec §4.E, §5).
pub struct ScriptProvider {
    source: String,
    allow_missing_validation_provider: bool,
}

impl ScriptProvider {
    pub fn new(source: impl Into<String>, allow_missing_validation_provider: bool) -> Self {
        Self {
            source: source.into(),
            allow_missing_validation_provider,
        }
    }

    pub async fn run_login(
        &self,
        username: String,
        password: String,
    ) -> Result<LoginOutcome, ScriptError> {
        let source = self.source.clone();
        let context_id = Uuid::new_v4().to_string();

        let join = tokio::task::spawn_blocking(move || {
            run_login_blocking(&source, &context_id, &username, &password)
        });

        match tokio::time::timeout(RUN_BUDGET, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(_join_err)) => Err(ScriptError::Runtime("script task panicked".into())),
            Err(_elapsed) => Err(ScriptError::Timeout(RUN_BUDGET)),
        }
    }

    pub async fn run_validate(&self, user: Value) -> Result<ValidationOutcome, ScriptError> {
        let source = self.source.clone();
        let context_id = Uuid::new_v4().to_string();
        let allow_missing = self.allow_missing_validation_provider;

        let join = tokio::task::spawn_blocking(move || {
            run_validate_blocking(&source, &context_id, user, allow_missing)
        });

        match tokio::time::timeout(RUN_BUDGET, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(_join_err)) => Err(ScriptError::Runtime("script task panicked".into())),
            Err(_elapsed) => Err(ScriptError::Timeout(RUN_BUDGET)),
        }
    }
}

fn build_engine_and_ast(
    source: &str,
    context_id: &str,
    commits: CommitLog,
) -> Result<(Engine, Scope<'static>, AST), ScriptError> {
    let mut engine = Engine::new();
    let mut scope = Scope::new();
    host::register_host_functions(&mut engine, &mut scope, context_id, commits);

    let ast = engine
        .compile(source)
        .map_err(|err| ScriptError::Compile(err.to_string()))?;
    Ok((engine, scope, ast))
}

fn run_login_blocking(
    source: &str,
    context_id: &str,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, ScriptError> {
    let commits: CommitLog = Arc::new(Mutex::new(Vec::new()));
    let (engine, mut scope, ast) = build_engine_and_ast(source, context_id, commits.clone())?;

    let mut credentials = rhai::Map::new();
    credentials.insert("username".into(), username.into());
    credentials.insert("password".into(), password.into());

    let result: rhai::Map = engine
        .call_fn(&mut scope, &ast, "user_login_provider", (credentials,))
        .map_err(|err| classify_call_error(*err, ScriptError::MissingLoginProvider))?;

    let can_login = result
        .get("can_login")
        .and_then(|v| v.as_bool().ok())
        .ok_or_else(|| ScriptError::MalformedResult("missing can_login".into()))?;

    let user_profile = result
        .get("user_profile")
        .map(host::dynamic_to_json)
        .unwrap_or(Value::Null);

    let role = result
        .get("role")
        .map(|v| v.to_string())
        .unwrap_or_default();

    let scopes = result
        .get("scopes")
        .and_then(|v| v.clone().try_cast::<rhai::Array>())
        .map(|arr| arr.iter().map(|item| item.to_string()).collect())
        .unwrap_or_default();

    let committed = commits.lock().expect("commit log poisoned");
    let subject = host::decode_subject(&committed);

    Ok(LoginOutcome {
        can_login,
        subject,
        user_profile,
        role,
        scopes,
    })
}

fn run_validate_blocking(
    source: &str,
    context_id: &str,
    user: Value,
    allow_missing: bool,
) -> Result<ValidationOutcome, ScriptError> {
    let commits: CommitLog = Arc::new(Mutex::new(Vec::new()));
    let (engine, mut scope, ast) = build_engine_and_ast(source, context_id, commits)?;

    let user_map = host::json_value_to_map(&user);

    match engine.call_fn::<rhai::Map>(&mut scope, &ast, "user_validation_provider", (user_map,)) {
        Ok(result) => {
            let is_valid = result
                .get("is_valid")
                .and_then(|v| v.as_bool().ok())
                .ok_or_else(|| ScriptError::MalformedResult("missing is_valid".into()))?;
            Ok(ValidationOutcome { is_valid })
        }
        Err(err) if is_function_not_found(&err) && allow_missing => {
            tracing::error!(
                context_id,
                "UserValidationProvider missing; allowing refresh under relaxed mode"
            );
            Ok(ValidationOutcome { is_valid: true })
        }
        Err(err) => Err(classify_call_error(*err, ScriptError::MissingValidationProvider)),
    }
}

fn classify_call_error(err: rhai::EvalAltResult, missing: ScriptError) -> ScriptError {
    if is_function_not_found(&err) {
        missing
    } else {
        ScriptError::Runtime(err.to_string())
    }
}

fn is_function_not_found(err: &rhai::EvalAltResult) -> bool {
    matches!(err, rhai::EvalAltResult::ErrorFunctionNotFound(..))
}
