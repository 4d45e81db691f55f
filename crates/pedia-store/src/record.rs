//! Stored resource records and the metadata derived from objects.

use std::fmt;

use chrono::{DateTime, Utc};
use pedia_core::{GroupVersionResource, ObjectMeta};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Stable position of a record in the append-only table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub usize);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub kind: String,

    pub cluster: String,
    pub namespace: String,
    pub name: String,
    /// UID of the controller owner reference, empty when there is none.
    pub owner_uid: String,
    pub uid: String,
    pub resource_version: String,

    /// Codec-encoded object.
    pub object: Vec<u8>,

    pub created_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
    /// Set when the record has been deleted. Tombstoned records stay in
    /// their slot but belong to no index.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ResourceRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// `cluster/namespace/name`, used in errors and logs.
    pub fn key(&self) -> String {
        object_key(&self.cluster, &self.namespace, &self.name)
    }
}

pub(crate) fn object_key(cluster: &str, namespace: &str, name: &str) -> String {
    format!("{cluster}/{namespace}/{name}")
}

/// Identity and ownership metadata read from an object before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectIdentity {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub resource_version: String,
    pub owner_uid: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectIdentity {
    /// Read identity from the JSON form of an object.
    pub fn from_value(object: &Value) -> StoreResult<Self> {
        let metadata = object
            .get("metadata")
            .ok_or_else(|| StoreError::InvalidObject("object has no metadata".to_string()))?;
        let meta = ObjectMeta::deserialize(metadata)
            .map_err(|e| StoreError::InvalidObject(format!("malformed metadata: {e}")))?;
        if meta.name.is_empty() {
            return Err(StoreError::InvalidObject(
                "metadata.name must not be empty".to_string(),
            ));
        }
        let owner_uid = meta
            .controller_ref()
            .map(|owner| owner.uid.clone())
            .unwrap_or_default();
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            kind,
            namespace: meta.namespace,
            name: meta.name,
            uid: meta.uid,
            resource_version: meta.resource_version,
            owner_uid,
            created_at: meta.creation_timestamp,
        })
    }

    /// Build the record stored for this object.
    pub fn into_record(
        self,
        gvr: &GroupVersionResource,
        cluster: &str,
        object: Vec<u8>,
        now: DateTime<Utc>,
    ) -> ResourceRecord {
        ResourceRecord {
            group: gvr.group.clone(),
            version: gvr.version.clone(),
            resource: gvr.resource.clone(),
            kind: self.kind,
            cluster: cluster.to_string(),
            namespace: self.namespace,
            name: self.name,
            owner_uid: self.owner_uid,
            uid: self.uid,
            resource_version: self.resource_version,
            object,
            created_at: self.created_at.unwrap_or(now),
            synced_at: now,
            deleted_at: None,
        }
    }
}

/// Names listed in an object's `metadata.ownerReferences`.
pub(crate) fn owner_reference_names(object: &Value) -> Vec<&str> {
    object
        .pointer("/metadata/ownerReferences")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .filter_map(|r| r.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
