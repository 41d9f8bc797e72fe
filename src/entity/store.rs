use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use arc_swap::ArcSwap;
use tracing::{error, info};
use uuid::Uuid;

use super::client::Client;
use super::source::{Entity, EntityEvent, EntityRef};
use super::tenant::Tenant;

/// Point-in-time view handed to a request; safe to hold for the request's
/// whole lifetime without observing a partial merge (spec §4.A, §5).
#[derive(Default)]
struct Snapshot {
    tenants: HashMap<String, std::sync::Arc<Tenant>>,
    clients_by_id: HashMap<Uuid, std::sync::Arc<Client>>,
    clients_by_name: HashMap<(String, String), std::sync::Arc<Client>>,
}

/// In-memory registry of Tenants and Clients, with host→tenant resolution
/// (spec §4.A). Writers are serialized through `write_lock`; readers take an
/// `Arc` snapshot and never block on a writer.
pub struct EntityStore {
    snapshot: ArcSwap<Snapshot>,
    /// Raw per-source-ref entities, the source of truth `apply_change` folds
    /// into `snapshot`. Guarded separately so write-side rebuilds don't block readers.
    entities: RwLock<HashMap<EntityRef, Entity>>,
    write_lock: Mutex<()>,
    observers: Mutex<Vec<Box<dyn Fn(&EntityEvent) + Send + Sync>>>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::new(std::sync::Arc::new(Snapshot::default())),
            entities: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn lookup_tenant_by_host(&self, host: &str) -> Option<std::sync::Arc<Tenant>> {
        let snapshot = self.snapshot.load();
        snapshot
            .tenants
            .values()
            .filter_map(|tenant| tenant.host_match_len(host).map(|len| (len, tenant)))
            .max_by_key(|(len, _)| *len)
            .map(|(_, tenant)| tenant.clone())
    }

    pub fn lookup_tenant_by_name(&self, name: &str) -> Option<std::sync::Arc<Tenant>> {
        self.snapshot.load().tenants.get(name).cloned()
    }

    pub fn lookup_client_by_id(&self, id: Uuid) -> Option<std::sync::Arc<Client>> {
        self.snapshot.load().clients_by_id.get(&id).cloned()
    }

    pub fn lookup_client_by_name(&self, name: &str, tenant: &str) -> Option<std::sync::Arc<Client>> {
        self.snapshot
            .load()
            .clients_by_name
            .get(&(tenant.to_string(), name.to_string()))
            .cloned()
    }

    pub fn observe(&self, callback: impl Fn(&EntityEvent) + Send + Sync + 'static) {
        self.observers.lock().expect("observers poisoned").push(Box::new(callback));
    }

    /// Convenience used by [`super::source::FileSource`] to add/replace an entity.
    pub fn apply_add(&self, entity_ref: EntityRef, entity: Entity) {
        self.apply_change(entity_ref, Some(entity));
    }

    pub fn apply_remove(&self, entity_ref: EntityRef) {
        self.apply_change(entity_ref, None);
    }

    /// Idempotently replaces or removes the entity identified by `entity_ref`,
    /// then atomically republishes the snapshot (spec §4.A).
    fn apply_change(&self, entity_ref: EntityRef, entity: Option<Entity>) {
        let _guard = self.write_lock.lock().expect("entity store write lock poisoned");

        {
            let mut entities = self.entities.write().expect("entities poisoned");
            match &entity {
                Some(entity) => {
                    entities.insert(entity_ref.clone(), entity.clone());
                }
                None => {
                    entities.remove(&entity_ref);
                }
            }
        }

        if let Err(err) = self.rebuild_snapshot() {
            error!(%err, ?entity_ref, "rejected entity due to host-pattern conflict");
            // the store remains in the last known good state (spec §4.A failure semantics)
            let mut entities = self.entities.write().expect("entities poisoned");
            entities.remove(&entity_ref);
            let _ = self.rebuild_snapshot();
            return;
        }

        let event = match entity {
            Some(entity) => EntityEvent::Add(entity_ref, entity),
            None => EntityEvent::Remove(entity_ref),
        };
        for observer in self.observers.lock().expect("observers poisoned").iter() {
            observer(&event);
        }
    }

    fn rebuild_snapshot(&self) -> Result<(), String> {
        let entities = self.entities.read().expect("entities poisoned");

        let mut tenants: HashMap<String, std::sync::Arc<Tenant>> = HashMap::new();
        for entity in entities.values() {
            if let Entity::Tenant(tenant) = entity {
                if tenants.contains_key(&tenant.name) {
                    return Err(format!("duplicate tenant name {}", tenant.name));
                }
                for (_, existing) in tenants.iter() {
                    if hosts_conflict(existing, tenant) {
                        return Err(format!(
                            "host pattern conflict between {} and {}",
                            existing.name, tenant.name
                        ));
                    }
                }
                tenants.insert(tenant.name.clone(), std::sync::Arc::new(tenant.clone()));
            }
        }

        let mut clients_by_id = HashMap::new();
        let mut clients_by_name = HashMap::new();
        for entity in entities.values() {
            if let Entity::Client(client) = entity {
                let client = std::sync::Arc::new(client.clone());
                clients_by_id.insert(client.ident, client.clone());
                clients_by_name.insert((client.tenant.clone(), client.name.clone()), client);
            }
        }

        info!(
            tenants = tenants.len(),
            clients = clients_by_id.len(),
            "entity store snapshot rebuilt"
        );

        self.snapshot.store(std::sync::Arc::new(Snapshot {
            tenants,
            clients_by_id,
            clients_by_name,
        }));
        Ok(())
    }
}

fn hosts_conflict(a: &Tenant, b: &Tenant) -> bool {
    a.host_patterns
        .iter()
        .any(|pattern| b.host_patterns.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(name: &str, patterns: &[&str]) -> Tenant {
        Tenant {
            name: name.to_string(),
            host_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            interceptor: Default::default(),
            provider_scripts: vec![],
            jwt_algorithm: None,
            silent_login: true,
            info_urls: vec![],
        }
    }

    #[test]
    fn lookup_by_host_resolves_unique_tenant() {
        let store = EntityStore::new();
        store.apply_add(
            EntityRef::File("a.yaml".into()),
            Entity::Tenant(tenant("cheese", &["*.cheese.example.com"])),
        );
        let found = store.lookup_tenant_by_host("cookbooks.cheese.example.com").unwrap();
        assert_eq!(found.name, "cheese");
        assert!(store.lookup_tenant_by_host("unrelated.example.com").is_none());
    }

    #[test]
    fn conflicting_host_pattern_is_rejected_keeping_last_good_state() {
        let store = EntityStore::new();
        store.apply_add(
            EntityRef::File("a.yaml".into()),
            Entity::Tenant(tenant("first", &["shared.example.com"])),
        );
        store.apply_add(
            EntityRef::File("b.yaml".into()),
            Entity::Tenant(tenant("second", &["shared.example.com"])),
        );

        let found = store.lookup_tenant_by_host("shared.example.com").unwrap();
        assert_eq!(found.name, "first");
    }

    #[test]
    fn apply_change_is_idempotent() {
        let store = EntityStore::new();
        let entity_ref = EntityRef::File("a.yaml".into());
        store.apply_add(entity_ref.clone(), Entity::Tenant(tenant("t", &["t.example.com"])));
        store.apply_add(entity_ref.clone(), Entity::Tenant(tenant("t", &["t.example.com"])));
        assert!(store.lookup_tenant_by_host("t.example.com").is_some());

        store.apply_remove(entity_ref);
        assert!(store.lookup_tenant_by_host("t.example.com").is_none());
    }
}
