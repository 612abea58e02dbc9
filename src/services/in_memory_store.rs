use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use k8s_openapi::api::{core::v1::ConfigMap, networking::v1::Ingress};
use kube::{Resource, ResourceExt};

use super::{ResourceStore, StoreError};
use crate::{
    common::{ResourceKey, TunnelConfiguration, CONFIGMAP_KEY},
    controllers::DocumentSelector,
};

type ConcurrentEdit = Box<dyn FnOnce(&mut ConfigMap) + Send>;

#[derive(Default)]
struct Objects {
    ingresses: BTreeMap<ResourceKey, Ingress>,
    config_maps: BTreeMap<ResourceKey, ConfigMap>,
    last_version: u64,
    ingress_writes: usize,
    config_map_writes: usize,
    fail_list: bool,
    fail_ingress_update: bool,
    fail_config_map_update: bool,
    conflicts: u32,
    concurrent_edit: Option<ConcurrentEdit>,
    delay: Option<Duration>,
}

impl Objects {
    fn next_version(&mut self) -> Option<String> {
        self.last_version += 1;
        Some(self.last_version.to_string())
    }
}

/// Store keeping objects in memory with API server like `resourceVersion` checks and garbage collection of deleted
/// objects once their finalizers are gone.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    objects: Arc<Mutex<Objects>>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Objects> {
        self.objects.lock().expect("We expect the lock to work")
    }

    pub fn insert_ingress(&self, mut ingress: Ingress) {
        let mut objects = self.lock();
        ingress.meta_mut().resource_version = objects.next_version();
        objects.ingresses.insert(ResourceKey::from(&ingress), ingress);
    }

    pub fn insert_config_map(&self, mut config_map: ConfigMap) {
        let mut objects = self.lock();
        config_map.meta_mut().resource_version = objects.next_version();
        objects.config_maps.insert(ResourceKey::from(&config_map), config_map);
    }

    pub fn ingress(&self, key: &ResourceKey) -> Option<Ingress> {
        self.lock().ingresses.get(key).cloned()
    }

    pub fn config_map(&self, key: &ResourceKey) -> Option<ConfigMap> {
        self.lock().config_maps.get(key).cloned()
    }

    pub fn payload(&self, key: &ResourceKey) -> Option<String> {
        self.config_map(key).and_then(|config_map| config_map.data.and_then(|mut data| data.remove(CONFIGMAP_KEY)))
    }

    pub fn configuration(&self, key: &ResourceKey) -> TunnelConfiguration {
        self.payload(key).map(|payload| TunnelConfiguration::decode(&payload).expect("payload should decode")).unwrap_or_default()
    }

    pub fn ingress_writes(&self) -> usize {
        self.lock().ingress_writes
    }

    pub fn config_map_writes(&self) -> usize {
        self.lock().config_map_writes
    }

    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn fail_ingress_update(&self, fail: bool) {
        self.lock().fail_ingress_update = fail;
    }

    pub fn fail_config_map_update(&self, fail: bool) {
        self.lock().fail_config_map_update = fail;
    }

    pub fn inject_conflicts(&self, conflicts: u32) {
        self.lock().conflicts = conflicts;
    }

    /// Applies `edit` to the first listed ConfigMap right after the next list, as another writer would.
    pub fn edit_after_next_list<F>(&self, edit: F)
    where
        F: FnOnce(&mut ConfigMap) + Send + 'static,
    {
        self.lock().concurrent_edit = Some(Box::new(edit));
    }

    pub fn delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    async fn wait(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get_ingress(&self, key: &ResourceKey) -> Result<Ingress, StoreError> {
        self.wait().await;
        self.lock().ingresses.get(key).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_ingress(&self, ingress: &Ingress) -> Result<Ingress, StoreError> {
        self.wait().await;
        let mut objects = self.lock();
        if objects.fail_ingress_update {
            return Err(StoreError::Transport("connection refused".to_owned()));
        }
        let key = ResourceKey::from(ingress);
        let Some(stored) = objects.ingresses.get(&key) else {
            return Err(StoreError::NotFound);
        };
        if stored.resource_version() != ingress.resource_version() {
            return Err(StoreError::Conflict(format!("ingress {key} has been modified")));
        }
        objects.ingress_writes += 1;
        let mut updated = ingress.clone();
        updated.meta_mut().resource_version = objects.next_version();
        if updated.meta().deletion_timestamp.is_some() && updated.finalizers().is_empty() {
            objects.ingresses.remove(&key);
        } else {
            objects.ingresses.insert(key, updated.clone());
        }
        Ok(updated)
    }

    async fn list_config_maps(&self, selector: &DocumentSelector) -> Result<Vec<ConfigMap>, StoreError> {
        self.wait().await;
        let mut objects = self.lock();
        if objects.fail_list {
            return Err(StoreError::Transport("connection refused".to_owned()));
        }
        let listed: Vec<ConfigMap> = objects.config_maps.values().filter(|config_map| selector.matches(config_map)).cloned().collect();
        if let (Some(edit), Some(first)) = (objects.concurrent_edit.take(), listed.first()) {
            let key = ResourceKey::from(first);
            let version = objects.next_version();
            if let Some(stored) = objects.config_maps.get_mut(&key) {
                edit(stored);
                stored.meta_mut().resource_version = version;
            }
        }
        Ok(listed)
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, StoreError> {
        self.wait().await;
        let mut objects = self.lock();
        if objects.fail_config_map_update {
            return Err(StoreError::Transport("connection refused".to_owned()));
        }
        let key = ResourceKey::from(config_map);
        if objects.conflicts > 0 {
            objects.conflicts -= 1;
            return Err(StoreError::Conflict(format!("configmap {key} has been modified")));
        }
        let Some(stored) = objects.config_maps.get(&key) else {
            return Err(StoreError::NotFound);
        };
        if stored.resource_version() != config_map.resource_version() {
            return Err(StoreError::Conflict(format!("configmap {key} has been modified")));
        }
        objects.config_map_writes += 1;
        let mut updated = config_map.clone();
        updated.meta_mut().resource_version = objects.next_version();
        objects.config_maps.insert(key, updated.clone());
        Ok(updated)
    }
}
