use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use notify::{RecursiveMode, Watcher};
use tracing::{error, info, warn};

use super::client::Client;
use super::store::EntityStore;
use super::tenant::Tenant;

/// Tags an entity to the external source it came from (spec §4.A/§6).
/// Kubernetes CRD watching is an explicit non-goal (spec §1); `K8s` exists
/// only so `apply_change`'s addressing scheme is complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    File(PathBuf),
    K8s { uid: String, revision: String },
}

impl EntityRef {
    /// Revision is ignored for matching purposes (spec §4.A).
    fn matches(&self, other: &EntityRef) -> bool {
        match (self, other) {
            (EntityRef::File(a), EntityRef::File(b)) => a == b,
            (EntityRef::K8s { uid: a, .. }, EntityRef::K8s { uid: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Entity {
    Tenant(Tenant),
    Client(Client),
}

#[derive(Debug, Clone)]
pub enum EntityEvent {
    Add(EntityRef, Entity),
    Remove(EntityRef),
}

/// External collaborator contract (spec §6 "Entity source"): emits add/remove
/// events which the core folds into the [`EntityStore`] via `apply_change`.
pub trait EntitySource: Send + Sync {
    fn run(&self, store: &EntityStore);
}

impl EntityRef {
    pub fn matches_any(&self, refs: impl Iterator<Item = EntityRef>) -> bool {
        refs.into_iter().any(|other| self.matches(&other))
    }
}

/// Watches `./Configurations/{Tenants,Clients}/*.yaml` for changes and folds
/// them into the store (spec §6 persisted layout).
pub struct FileSource {
    tenants_dir: PathBuf,
    clients_dir: PathBuf,
}

impl FileSource {
    pub fn new(tenants_dir: PathBuf, clients_dir: PathBuf) -> Self {
        Self {
            tenants_dir,
            clients_dir,
        }
    }

    fn load_all(&self, store: &EntityStore) {
        load_dir::<Tenant>(&self.tenants_dir, store, Entity::Tenant);
        load_dir::<Client>(&self.clients_dir, store, Entity::Client);
    }

    /// Loads every tenant/client file once without starting the watcher,
    /// for the `gatewarden configure` one-shot CLI command.
    pub fn load_once(&self, store: &EntityStore) {
        self.load_all(store);
    }
}

fn load_dir<T: serde::de::DeserializeOwned>(
    dir: &Path,
    store: &EntityStore,
    wrap: impl Fn(T) -> Entity,
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        warn!(?dir, "entity directory does not exist, skipping");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }

        match std::fs::read_to_string(&path).and_then(|content| {
            serde_yaml::from_str::<T>(&content).map_err(std::io::Error::other)
        }) {
            Ok(parsed) => {
                store.apply_add(EntityRef::File(path.clone()), wrap(parsed));
            }
            Err(err) => {
                error!(?path, %err, "failed to load entity, skipping");
            }
        }
    }
}

impl EntitySource for FileSource {
    fn run(&self, store: &EntityStore) {
        self.load_all(store);

        let (tx, rx) = channel();
        let mut watcher = match notify::recommended_watcher(move |event| {
            let _ = tx.send(event);
        }) {
            Ok(watcher) => watcher,
            Err(err) => {
                error!(%err, "failed to start file entity-source watcher");
                return;
            }
        };

        for dir in [&self.tenants_dir, &self.clients_dir] {
            if let Err(err) = watcher.watch(dir, RecursiveMode::NonRecursive) {
                warn!(?dir, %err, "failed to watch entity directory");
            }
        }

        info!("file entity source watching for changes");

        for event in rx {
            match event {
                Ok(_) => self.load_all(store),
                Err(err) => warn!(%err, "entity source watch error"),
            }
        }
    }
}
