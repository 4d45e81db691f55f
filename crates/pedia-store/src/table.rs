//! Append-only record table with cluster and namespace indices.
//!
//! Slots are handed out in increasing order and never reused, so appending
//! a new slot to the tail of an index list keeps it sorted. Deletion
//! tombstones the record and splices its slot out of both lists, which also
//! preserves order. Every list therefore stays strictly ascending, which the
//! merge-join in [`crate::intersect`] relies on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pedia_core::OwnerScope;

use crate::intersect::{intersect_sorted, is_strictly_ascending};
use crate::record::{ResourceRecord, Slot};

#[derive(Debug, Default)]
pub struct Database {
    records: Vec<ResourceRecord>,
    clusters: BTreeMap<String, Vec<Slot>>,
    namespaces: BTreeMap<String, Vec<Slot>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and index it under its cluster and namespace.
    pub fn insert(&mut self, record: ResourceRecord) -> Slot {
        let slot = Slot(self.records.len());
        self.clusters
            .entry(record.cluster.clone())
            .or_default()
            .push(slot);
        self.namespaces
            .entry(record.namespace.clone())
            .or_default()
            .push(slot);
        self.records.push(record);
        self.debug_check_indices();
        slot
    }

    /// Record at `slot`, tombstoned or not.
    pub fn record(&self, slot: Slot) -> Option<&ResourceRecord> {
        self.records.get(slot.0)
    }

    /// Record at `slot` if it has not been deleted.
    pub fn live(&self, slot: Slot) -> Option<&ResourceRecord> {
        self.record(slot).filter(|r| r.is_live())
    }

    /// Overwrite a live record in place. The replacement must keep the same
    /// cluster and namespace, so index membership is unchanged.
    pub fn replace(&mut self, slot: Slot, record: ResourceRecord) -> bool {
        match self.records.get_mut(slot.0) {
            Some(current)
                if current.is_live()
                    && current.cluster == record.cluster
                    && current.namespace == record.namespace =>
            {
                *current = record;
                true
            }
            _ => false,
        }
    }

    /// Tombstone a live record and drop it from both indices.
    pub fn tombstone(&mut self, slot: Slot, at: DateTime<Utc>) -> bool {
        let Some(record) = self.records.get_mut(slot.0).filter(|r| r.is_live()) else {
            return false;
        };
        record.deleted_at = Some(at);
        let (cluster, namespace) = (record.cluster.clone(), record.namespace.clone());
        remove_from_index(&mut self.clusters, &cluster, slot);
        remove_from_index(&mut self.namespaces, &namespace, slot);
        self.debug_check_indices();
        true
    }

    /// Slots indexed under both `cluster` and `namespace`.
    pub fn intersect(&self, cluster: &str, namespace: &str) -> Vec<Slot> {
        match (self.clusters.get(cluster), self.namespaces.get(namespace)) {
            (Some(c), Some(n)) => intersect_sorted(c, n),
            _ => Vec::new(),
        }
    }

    /// Candidate slots for every (cluster, namespace) pair. An empty set on
    /// either side stands for every key of that index.
    pub fn candidates(&self, clusters: &[String], namespaces: &[String]) -> Vec<Slot> {
        let clusters: Vec<&str> = if clusters.is_empty() {
            self.clusters.keys().map(String::as_str).collect()
        } else {
            clusters.iter().map(String::as_str).collect()
        };
        let namespaces: Vec<&str> = if namespaces.is_empty() {
            self.namespaces.keys().map(String::as_str).collect()
        } else {
            namespaces.iter().map(String::as_str).collect()
        };

        let mut slots = Vec::new();
        for cluster in &clusters {
            for namespace in &namespaces {
                slots.extend(self.intersect(cluster, namespace));
            }
        }
        slots
    }

    /// Find the live record named `name` in `cluster`/`namespace`.
    pub fn locate(&self, cluster: &str, namespace: &str, name: &str) -> Option<Slot> {
        self.intersect(cluster, namespace)
            .into_iter()
            .find(|slot| self.records[slot.0].name == name)
    }

    /// First live record named `name`, in slot order, within `scope` of
    /// `subject`.
    pub fn find_by_name(&self, name: &str, subject: &ResourceRecord, scope: OwnerScope) -> Option<Slot> {
        self.live_records()
            .find(|(_, r)| {
                r.name == name
                    && match scope {
                        OwnerScope::Global => true,
                        OwnerScope::Cluster => r.cluster == subject.cluster,
                        OwnerScope::Namespace => {
                            r.cluster == subject.cluster && r.namespace == subject.namespace
                        }
                    }
            })
            .map(|(slot, _)| slot)
    }

    pub fn live_records(&self) -> impl Iterator<Item = (Slot, &ResourceRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_live())
            .map(|(i, r)| (Slot(i), r))
    }

    /// Live slots of a cluster, ascending.
    pub fn cluster_slots(&self, cluster: &str) -> &[Slot] {
        self.clusters.get(cluster).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cluster_names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots handed out, including tombstones.
    pub fn slot_count(&self) -> usize {
        self.records.len()
    }

    fn debug_check_indices(&self) {
        debug_assert!(
            self.clusters
                .values()
                .chain(self.namespaces.values())
                .all(|slots| is_strictly_ascending(slots)),
            "index lists must stay strictly ascending"
        );
    }
}

/// Splice one occurrence of `slot` out of `index[key]`, dropping the key
/// once its list is empty.
fn remove_from_index(index: &mut BTreeMap<String, Vec<Slot>>, key: &str, slot: Slot) {
    let Some(slots) = index.get_mut(key) else {
        return;
    };
    if let Ok(pos) = slots.binary_search(&slot) {
        slots.remove(pos);
    }
    if slots.is_empty() {
        index.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedia_core::GroupVersionResource;

    use crate::record::ObjectIdentity;

    fn record(cluster: &str, namespace: &str, name: &str) -> ResourceRecord {
        ObjectIdentity {
            kind: "Pod".to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            uid: format!("uid-{name}"),
            resource_version: "1".to_string(),
            owner_uid: String::new(),
            created_at: None,
        }
        .into_record(
            &GroupVersionResource::new("", "v1", "pods"),
            cluster,
            Vec::new(),
            Utc::now(),
        )
    }

    fn names(db: &Database, slots: &[Slot]) -> Vec<String> {
        slots
            .iter()
            .map(|s| db.record(*s).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn insert_indexes_by_cluster_and_namespace() {
        let mut db = Database::new();
        db.insert(record("c1", "default", "a"));
        db.insert(record("c2", "default", "b"));
        db.insert(record("c1", "kube-system", "c"));
        db.insert(record("c1", "default", "d"));

        assert_eq!(names(&db, &db.intersect("c1", "default")), vec!["a", "d"]);
        assert_eq!(names(&db, &db.intersect("c1", "kube-system")), vec!["c"]);
        assert!(db.intersect("c3", "default").is_empty());
        assert_eq!(db.len(), 4);
    }

    #[test]
    fn empty_scopes_expand_to_all_keys() {
        let mut db = Database::new();
        db.insert(record("c1", "default", "a"));
        db.insert(record("c2", "kube-system", "b"));

        assert_eq!(db.candidates(&[], &[]).len(), 2);
        assert_eq!(db.candidates(&["c2".to_string()], &[]), vec![Slot(1)]);
        assert_eq!(db.candidates(&[], &["default".to_string()]), vec![Slot(0)]);
    }

    #[test]
    fn tombstone_splices_indices_and_keeps_slot() {
        let mut db = Database::new();
        let a = db.insert(record("c1", "default", "a"));
        let b = db.insert(record("c1", "default", "b"));
        let c = db.insert(record("c1", "default", "c"));

        assert!(db.tombstone(b, Utc::now()));
        assert!(!db.tombstone(b, Utc::now()));
        assert_eq!(db.intersect("c1", "default"), vec![a, c]);
        assert_eq!(db.cluster_slots("c1"), &[a, c]);
        assert!(db.record(b).unwrap().deleted_at.is_some());
        assert!(db.live(b).is_none());
        assert_eq!(db.len(), 2);
        assert_eq!(db.slot_count(), 3);

        let d = db.insert(record("c1", "default", "b"));
        assert_eq!(d, Slot(3));
        assert_eq!(db.intersect("c1", "default"), vec![a, c, d]);
    }

    #[test]
    fn emptied_index_keys_are_dropped() {
        let mut db = Database::new();
        let a = db.insert(record("c1", "only", "a"));
        db.tombstone(a, Utc::now());
        assert_eq!(db.cluster_names().count(), 0);
        assert_eq!(db.namespace_names().count(), 0);
        assert!(db.is_empty());
    }

    #[test]
    fn locate_and_replace() {
        let mut db = Database::new();
        db.insert(record("c1", "default", "a"));
        let b = db.insert(record("c1", "default", "b"));

        assert_eq!(db.locate("c1", "default", "b"), Some(b));
        assert_eq!(db.locate("c1", "other", "b"), None);

        let mut updated = record("c1", "default", "b");
        updated.resource_version = "2".to_string();
        assert!(db.replace(b, updated));
        assert_eq!(db.record(b).unwrap().resource_version, "2");

        // moving namespaces through replace is refused
        assert!(!db.replace(b, record("c1", "elsewhere", "b")));
    }

    #[test]
    fn find_by_name_respects_scope() {
        let mut db = Database::new();
        let far = db.insert(record("c2", "default", "owner"));
        let near = db.insert(record("c1", "apps", "owner"));
        let exact = db.insert(record("c1", "default", "owner"));
        let subject = record("c1", "default", "child");

        assert_eq!(db.find_by_name("owner", &subject, OwnerScope::Global), Some(far));
        assert_eq!(db.find_by_name("owner", &subject, OwnerScope::Cluster), Some(near));
        assert_eq!(db.find_by_name("owner", &subject, OwnerScope::Namespace), Some(exact));

        db.tombstone(far, Utc::now());
        assert_eq!(db.find_by_name("owner", &subject, OwnerScope::Global), Some(near));
        assert_eq!(db.find_by_name("missing", &subject, OwnerScope::Global), None);
    }
}
