#![deny(unsafe_code)]

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use gatewarden_keys::{Algorithm, KeyStore, Signer};
use gatewarden_store::{CodeSessionStore, MemoryStore, RedisStore};
use tracing::info;

pub use config::EnvConfig;

pub mod audit;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod template;
pub mod test_support;
pub mod web;

mod util;

#[cfg(test)]
mod tests;

use entity::{EntitySource, EntityStore, FileSource};
use metrics::{MetricsSink, NoopMetricsSink};
use template::{NullTemplateSource, TemplateSource};

/// Common context for the whole application. A clonable wrapper for
/// [`AppState`], mirroring the teacher's `AuthlyCtx`/`AuthlyState` split.
#[derive(Clone)]
pub struct AppCtx {
    state: Arc<AppState>,
}

impl Deref for AppCtx {
    type Target = Arc<AppState>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

pub struct AppState {
    pub entity_store: EntityStore,
    pub code_store: Arc<dyn CodeSessionStore>,
    pub key_store: Arc<KeyStore>,
    pub signer: Signer,
    pub metrics: Arc<dyn MetricsSink>,
    pub template: Arc<dyn TemplateSource>,
    pub config: EnvConfig,
    /// Prefix for the SSO cookie name: `{app}-sso` (spec §4.H/§6).
    pub app_name: String,
}

impl AppCtx {
    /// Wraps a fully-assembled `AppState`, used by `test_support` to build
    /// an in-memory context without going through [`AppCtx::new`]'s I/O.
    pub fn from_state(state: AppState) -> Self {
        Self { state: Arc::new(state) }
    }

    pub async fn new(config: EnvConfig) -> anyhow::Result<Self> {
        let key_store = Arc::new(KeyStore::new(config.jwt_secret_or_generated()));
        let signer = Signer::new(key_store.clone(), config.jwt_algorithm());

        let code_store: Arc<dyn CodeSessionStore> = match &config.redis_host {
            Some(host) => {
                let url = format!(
                    "redis://{}{}/",
                    config
                        .redis_password
                        .as_ref()
                        .map(|p| format!(":{p}@"))
                        .unwrap_or_default(),
                    host
                );
                Arc::new(
                    RedisStore::connect(&url)
                        .await
                        .map_err(|err| anyhow::anyhow!("failed to connect to redis: {err}"))?,
                )
            }
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self {
            state: Arc::new(AppState {
                entity_store: EntityStore::new(),
                code_store,
                key_store,
                signer,
                metrics: Arc::new(NoopMetricsSink),
                template: Arc::new(NullTemplateSource),
                config,
                app_name: "gatewarden".to_string(),
            }),
        })
    }
}

pub async fn serve(ctx: AppCtx) -> anyhow::Result<()> {
    let bind_addr: SocketAddr = ctx.config.bind_addr.parse()?;
    let router = web::router(ctx.clone());

    spawn_entity_source(ctx.clone());

    info!(%bind_addr, "gatewarden listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Starts the filesystem entity watcher (spec §4.A) on a blocking task,
/// since [`FileSource::run`] blocks forever on an `mpsc::Receiver`.
fn spawn_entity_source(ctx: AppCtx) {
    let source = FileSource::new(ctx.config.tenants_dir(), ctx.config.clients_dir());
    tokio::task::spawn_blocking(move || {
        source.run(&ctx.entity_store);
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Forces a new RSA signing key into existence, for the `gen-rsa-key` CLI
/// subcommand (SPEC_FULL §3).
pub fn gen_rsa_key(key_store: &KeyStore, kid: &str, set_active: bool) -> anyhow::Result<()> {
    let metadata = key_store
        .generate_and_store(kid, set_active)
        .map_err(|err| anyhow::anyhow!("failed to generate RSA key: {err}"))?;
    info!(kid = %metadata.kid, "generated RSA key pair");
    Ok(())
}

pub fn default_algorithm() -> Algorithm {
    Algorithm::Hs256
}
