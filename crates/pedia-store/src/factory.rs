//! StorageFactory — routes objects to the storage registered for their kind.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use pedia_core::{GroupVersionKind, GroupVersionResource, Object, PediaConfig};
use tracing::{debug, info};

use crate::codec::{Codec, JsonCodec};
use crate::error::{StoreError, StoreResult};
use crate::store::{ResourceStorage, StorageConfig};

/// Registry of [`ResourceStorage`]s keyed by group/version/kind.
///
/// Every storage created here shares one codec.
#[derive(Clone)]
pub struct StorageFactory {
    storages: Arc<RwLock<HashMap<GroupVersionKind, ResourceStorage>>>,
    codec: Arc<dyn Codec>,
}

impl Default for StorageFactory {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec))
    }
}

impl StorageFactory {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            storages: Arc::new(RwLock::new(HashMap::new())),
            codec,
        }
    }

    /// Build a factory with one storage per configured resource.
    pub fn from_config(config: &PediaConfig) -> StoreResult<Self> {
        let factory = Self::default();
        for resource in &config.resources {
            let storage_config = StorageConfig::new(resource.group_version_resource(), &resource.kind)
                .with_owner_scope(config.store.owner_scope);
            factory.new_resource_storage(storage_config)?;
        }
        info!(
            resources = config.resources.len(),
            owner_scope = ?config.store.owner_scope,
            "storage factory initialised"
        );
        Ok(factory)
    }

    /// Register a storage for `config`'s kind. An existing registration for
    /// the same kind is returned unchanged.
    pub fn new_resource_storage(&self, config: StorageConfig) -> StoreResult<ResourceStorage> {
        let gvk = config.group_version_kind();
        let mut storages = self.storages.write().map_err(|_| StoreError::LockPoisoned)?;
        let storage = storages
            .entry(gvk.clone())
            .or_insert_with(|| {
                debug!(%gvk, resource = %config.resource, "registering resource storage");
                ResourceStorage::new(config, Arc::clone(&self.codec))
            })
            .clone();
        Ok(storage)
    }

    pub fn resource_storage(&self, gvk: &GroupVersionKind) -> StoreResult<ResourceStorage> {
        let storages = self.storages.read().map_err(|_| StoreError::LockPoisoned)?;
        storages
            .get(gvk)
            .cloned()
            .ok_or_else(|| StoreError::StorageNotRegistered(gvk.to_string()))
    }

    /// Every registered kind, sorted.
    pub fn kinds(&self) -> StoreResult<Vec<GroupVersionKind>> {
        let storages = self.storages.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut kinds: Vec<_> = storages.keys().cloned().collect();
        kinds.sort();
        Ok(kinds)
    }

    fn storages(&self) -> StoreResult<Vec<ResourceStorage>> {
        let storages = self.storages.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(storages.values().cloned().collect())
    }

    /// Create `object` in the storage registered for its apiVersion/kind.
    pub fn create(&self, cluster: &str, object: &Object) -> StoreResult<()> {
        self.resource_storage(&object.group_version_kind())?
            .create(cluster, object)
    }

    /// Delete every record of `cluster` from every storage.
    pub fn clean_cluster(&self, cluster: &str) -> StoreResult<usize> {
        let mut removed = 0;
        for storage in self.storages()? {
            removed += storage.clean_cluster(cluster)?;
        }
        info!(cluster, removed, "cluster removed from every storage");
        Ok(removed)
    }

    /// Delete `cluster`'s records from the storage holding `resource`.
    pub fn clean_cluster_resource(&self, cluster: &str, resource: &GroupVersionResource) -> StoreResult<usize> {
        let mut removed = 0;
        for storage in self.storages()? {
            if &storage.config().resource == resource {
                removed += storage.clean_cluster(cluster)?;
            }
        }
        Ok(removed)
    }

    /// Resource versions of `cluster`, per stored resource type.
    pub fn resource_versions(
        &self,
        cluster: &str,
    ) -> StoreResult<BTreeMap<GroupVersionResource, BTreeMap<String, String>>> {
        let mut versions = BTreeMap::new();
        for storage in self.storages()? {
            let stored = storage.resource_versions(cluster)?;
            if !stored.is_empty() {
                versions.insert(storage.config().resource.clone(), stored);
            }
        }
        Ok(versions)
    }
}
