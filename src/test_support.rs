//! In-process `AppCtx` builder for tests, mirroring the teacher's `ctx::test`.

use std::sync::Arc;

use gatewarden_keys::{Algorithm, KeyStore, Signer};
use gatewarden_store::MemoryStore;

use crate::config::{Environment, LogFormat};
use crate::entity::{Client, EntityRef, Entity, EntityStore, Tenant};
use crate::metrics::NoopMetricsSink;
use crate::template::NullTemplateSource;
use crate::{AppCtx, AppState, EnvConfig};

/// Builds an `AppCtx` wired entirely to in-memory backends: a fresh
/// `MemoryStore`, an HS256 `Signer` over a throwaway secret, and an empty
/// `EntityStore` the test populates directly.
pub fn test_ctx() -> AppCtx {
    let config = EnvConfig {
        jwt_secret: Some("test-secret-test-secret-test-secret".to_string()),
        log_format: LogFormat::Pretty,
        environment: Environment::Dev,
        ..Default::default()
    };

    let key_store = Arc::new(KeyStore::new(config.jwt_secret_or_generated()));
    let signer = Signer::new(key_store.clone(), Algorithm::Hs256);

    AppCtx::from_state(AppState {
        entity_store: EntityStore::new(),
        code_store: Arc::new(MemoryStore::new()),
        key_store,
        signer,
        metrics: Arc::new(NoopMetricsSink),
        template: Arc::new(NullTemplateSource),
        config,
        app_name: "gatewarden".to_string(),
    })
}

/// Registers a tenant under a synthetic `EntityRef` so tests can resolve it
/// by host without going through `FileSource`.
pub fn add_tenant(ctx: &AppCtx, tenant: Tenant) {
    let name = tenant.name.clone();
    ctx.entity_store
        .apply_add(EntityRef::File(format!("test-tenant-{name}").into()), Entity::Tenant(tenant));
}

pub fn add_client(ctx: &AppCtx, client: Client) {
    let id = client.ident;
    ctx.entity_store
        .apply_add(EntityRef::File(format!("test-client-{id}").into()), Entity::Client(client));
}
