//! ResourceStorage — the per-resource-type index.
//!
//! Provides typed Create/Get/Update/Delete/List over one resource type
//! (e.g. `v1/pods`) across every cluster. Objects are converted to
//! `serde_json::Value` and handed to the injected [`Codec`]; the table only
//! ever holds the encoded bytes plus the identity metadata read at write
//! time.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use pedia_core::{GroupVersionKind, GroupVersionResource, ListOptions, OwnerScope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{Codec, CodecError, JsonCodec};
use crate::error::{StoreError, StoreResult};
use crate::filter::{self, FilterContext};
use crate::paginate::paginate;
use crate::query::{ListQuery, compare_records};
use crate::record::{ObjectIdentity, Slot, object_key};
use crate::table::Database;

/// Identity of the resource type a storage holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub resource: GroupVersionResource,
    pub kind: String,
    pub owner_scope: OwnerScope,
}

impl StorageConfig {
    pub fn new(resource: GroupVersionResource, kind: &str) -> Self {
        Self {
            resource,
            kind: kind.to_string(),
            owner_scope: OwnerScope::default(),
        }
    }

    pub fn with_owner_scope(mut self, scope: OwnerScope) -> Self {
        self.owner_scope = scope;
        self
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::new(&self.resource.group, &self.resource.version, &self.kind)
    }
}

/// One page of List results.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Offset of the next page; `None` on the last page.
    pub continue_token: Option<String>,
    /// Items after this page, when the query asked for it.
    pub remaining: Option<i64>,
    /// Candidates dropped because their payload could not be decoded.
    pub skipped: usize,
}

/// Thread-safe in-memory index for one resource type.
#[derive(Clone)]
pub struct ResourceStorage {
    db: Arc<RwLock<Database>>,
    codec: Arc<dyn Codec>,
    config: StorageConfig,
}

impl fmt::Debug for ResourceStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceStorage {
    pub fn new(config: StorageConfig, codec: Arc<dyn Codec>) -> Self {
        debug!(resource = %config.resource, kind = %config.kind, "resource storage created");
        Self {
            db: Arc::new(RwLock::new(Database::new())),
            codec,
            config,
        }
    }

    /// A storage using [`JsonCodec`].
    pub fn with_json_codec(config: StorageConfig) -> Self {
        Self::new(config, Arc::new(JsonCodec))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Database>> {
        self.db.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Database>> {
        self.db.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Serialize and encode an object, reading its identity on the way.
    fn encode<T: Serialize>(&self, object: &T) -> StoreResult<(ObjectIdentity, Vec<u8>)> {
        let value = serde_json::to_value(object).map_err(CodecError::from)?;
        let identity = ObjectIdentity::from_value(&value)?;
        let bytes = self.codec.encode(&value)?;
        Ok((identity, bytes))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StoreResult<T> {
        let value: Value = self.codec.decode(bytes)?;
        Ok(serde_json::from_value(value).map_err(CodecError::from)?)
    }

    // ── Write path ─────────────────────────────────────────────────

    /// Store a new object for `cluster`.
    pub fn create<T: Serialize>(&self, cluster: &str, object: &T) -> StoreResult<()> {
        let (identity, bytes) = self.encode(object)?;
        let mut db = self.write()?;
        if db
            .locate(cluster, &identity.namespace, &identity.name)
            .is_some()
        {
            return Err(StoreError::AlreadyExists(object_key(
                cluster,
                &identity.namespace,
                &identity.name,
            )));
        }
        let record = identity.into_record(&self.config.resource, cluster, bytes, Utc::now());
        let key = record.key();
        let slot = db.insert(record);
        debug!(%key, %slot, "resource created");
        Ok(())
    }

    /// Replace the stored object with the same cluster/namespace/name. The
    /// record keeps its slot and index membership.
    pub fn update<T: Serialize>(&self, cluster: &str, object: &T) -> StoreResult<()> {
        let (identity, bytes) = self.encode(object)?;
        let mut db = self.write()?;
        let key = object_key(cluster, &identity.namespace, &identity.name);
        let slot = db
            .locate(cluster, &identity.namespace, &identity.name)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        // Objects without a creation timestamp keep the stored one.
        let previous_created = match identity.created_at {
            Some(_) => None,
            None => db.live(slot).map(|r| r.created_at),
        };

        let mut record = identity.into_record(&self.config.resource, cluster, bytes, Utc::now());
        if let Some(created_at) = previous_created {
            record.created_at = created_at;
        }
        if !db.replace(slot, record) {
            return Err(StoreError::NotFound(key));
        }
        debug!(%key, %slot, "resource updated");
        Ok(())
    }

    /// Delete the stored object matching `object`'s namespace and name.
    pub fn delete<T: Serialize>(&self, cluster: &str, object: &T) -> StoreResult<()> {
        let value = serde_json::to_value(object).map_err(CodecError::from)?;
        let identity = ObjectIdentity::from_value(&value)?;
        self.delete_by_name(cluster, &identity.namespace, &identity.name)
    }

    pub fn delete_by_name(&self, cluster: &str, namespace: &str, name: &str) -> StoreResult<()> {
        let mut db = self.write()?;
        let key = object_key(cluster, namespace, name);
        let slot = db
            .locate(cluster, namespace, name)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        db.tombstone(slot, Utc::now());
        debug!(%key, %slot, "resource deleted");
        Ok(())
    }

    /// Delete every record of `cluster`. Returns how many were removed.
    pub fn clean_cluster(&self, cluster: &str) -> StoreResult<usize> {
        let mut db = self.write()?;
        let slots: Vec<Slot> = db.cluster_slots(cluster).to_vec();
        let now = Utc::now();
        for slot in &slots {
            db.tombstone(*slot, now);
        }
        debug!(cluster, removed = slots.len(), resource = %self.config.resource, "cluster cleaned");
        Ok(slots.len())
    }

    // ── Read path ──────────────────────────────────────────────────

    pub fn get<T: DeserializeOwned>(&self, cluster: &str, namespace: &str, name: &str) -> StoreResult<T> {
        let db = self.read()?;
        let slot = db
            .locate(cluster, namespace, name)
            .ok_or_else(|| StoreError::NotFound(object_key(cluster, namespace, name)))?;
        let record = db
            .live(slot)
            .ok_or_else(|| StoreError::NotFound(object_key(cluster, namespace, name)))?;
        self.decode(&record.object)
    }

    /// Decode wire options and run the query.
    pub fn list<T: DeserializeOwned>(&self, options: &ListOptions) -> StoreResult<ListPage<T>> {
        let query = ListQuery::from_options(options)?;
        self.list_query(&query)
    }

    pub fn list_query<T: DeserializeOwned>(&self, query: &ListQuery) -> StoreResult<ListPage<T>> {
        let db = self.read()?;

        let candidates = db.candidates(&query.clusters, &query.namespaces);
        let found = candidates.len();

        let mut ctx = FilterContext::new(&db, self.codec.as_ref(), self.config.owner_scope);
        let mut slots = filter::apply(&mut ctx, query, candidates);
        let mut skipped = ctx.skipped();

        if !query.order_by.is_empty() {
            slots.sort_by(|a, b| match (db.record(*a), db.record(*b)) {
                (Some(a), Some(b)) => compare_records(&query.order_by, a, b),
                _ => std::cmp::Ordering::Equal,
            });
        }

        let window = paginate(slots.len(), query.limit, query.continue_token.as_deref());
        let mut items = Vec::with_capacity(window.range.len());
        for slot in &slots[window.range.clone()] {
            let Some(record) = db.live(*slot) else {
                continue;
            };
            match self.decode(&record.object) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(
                        key = %record.key(),
                        error = %e,
                        "skipping record that does not decode into the list type"
                    );
                    skipped += 1;
                }
            }
        }

        debug!(
            resource = %self.config.resource,
            candidates = found,
            matched = slots.len(),
            returned = items.len(),
            skipped,
            "list completed"
        );
        Ok(ListPage {
            items,
            continue_token: window.continue_token,
            remaining: query.with_remaining_count.then_some(window.remaining as i64),
            skipped,
        })
    }

    /// `namespace/name` → resource version for every live record of
    /// `cluster`.
    pub fn resource_versions(&self, cluster: &str) -> StoreResult<BTreeMap<String, String>> {
        let db = self.read()?;
        Ok(db
            .cluster_slots(cluster)
            .iter()
            .filter_map(|slot| db.live(*slot))
            .map(|r| (format!("{}/{}", r.namespace, r.name), r.resource_version.clone()))
            .collect())
    }

    /// Number of live records.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Slot currently holding `cluster/namespace/name`.
    pub fn slot_of(&self, cluster: &str, namespace: &str, name: &str) -> StoreResult<Option<Slot>> {
        Ok(self.read()?.locate(cluster, namespace, name))
    }
}
