//! Filter pipeline applied to intersection candidates.
//!
//! Stages run in a fixed order and each one only narrows the slot list:
//!
//! 1. name set (exact names and fuzzy fragments, from record metadata)
//! 2. owner UID (controller reference recorded at write time)
//! 3. label selector (decoded `metadata.labels`)
//! 4. field selector (dotted paths over the decoded object)
//! 5. owner-name chain (see [`crate::owner`])
//!
//! Payloads are decoded at most once per List call. A candidate whose
//! payload does not decode is dropped and counted in
//! [`FilterContext::skipped`] rather than failing the whole query.

use std::collections::{BTreeSet, HashMap};

use pedia_core::{OwnerScope, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::owner;
use crate::query::ListQuery;
use crate::record::Slot;
use crate::table::Database;

/// Per-call state shared by the filter stages.
pub struct FilterContext<'a> {
    pub(crate) db: &'a Database,
    codec: &'a dyn Codec,
    pub(crate) owner_scope: OwnerScope,
    decoded: HashMap<Slot, Option<Value>>,
    skipped: BTreeSet<Slot>,
}

impl<'a> FilterContext<'a> {
    pub fn new(db: &'a Database, codec: &'a dyn Codec, owner_scope: OwnerScope) -> Self {
        Self {
            db,
            codec,
            owner_scope,
            decoded: HashMap::new(),
            skipped: BTreeSet::new(),
        }
    }

    /// Decoded payload of `slot`, or `None` when it cannot be decoded.
    pub(crate) fn payload(&mut self, slot: Slot) -> Option<&Value> {
        let (db, codec) = (self.db, self.codec);
        self.decoded
            .entry(slot)
            .or_insert_with(|| {
                let record = db.record(slot)?;
                match codec.decode(&record.object) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(
                            slot = %slot,
                            key = %record.key(),
                            error = %e,
                            "skipping record with undecodable payload"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Like [`Self::payload`], but remembers the slot as a skipped
    /// candidate on failure.
    pub(crate) fn candidate_payload(&mut self, slot: Slot) -> Option<&Value> {
        if self.payload(slot).is_none() {
            self.skipped.insert(slot);
            return None;
        }
        self.payload(slot)
    }

    /// Candidates dropped because their payload failed to decode.
    pub fn skipped(&self) -> usize {
        self.skipped.len()
    }
}

/// Run every stage the query asks for.
pub fn apply(ctx: &mut FilterContext<'_>, query: &ListQuery, mut slots: Vec<Slot>) -> Vec<Slot> {
    if !query.names.is_empty() || !query.fuzzy_names.is_empty() {
        slots = filter_names(ctx.db, &query.names, &query.fuzzy_names, slots);
        debug!(matched = slots.len(), "name filter applied");
    }
    if !query.owner_uids.is_empty() {
        slots = filter_owner_uid(ctx.db, &query.owner_uids, slots);
        debug!(matched = slots.len(), "owner uid filter applied");
    }
    if !query.label_selector.is_empty() {
        slots = filter_labels(ctx, &query.label_selector, slots);
        debug!(matched = slots.len(), "label selector applied");
    }
    if !query.field_selector.is_empty() {
        slots = filter_fields(ctx, &query.field_selector, slots);
        debug!(matched = slots.len(), "field selector applied");
    }
    if let Some(name) = &query.owner_name {
        slots = owner::filter_by_owner_name(ctx, name, query.owner_seniority, slots);
        debug!(
            owner = %name,
            seniority = query.owner_seniority,
            matched = slots.len(),
            "owner chain filter applied"
        );
    }
    slots
}

/// Keep records named in `names` (when given) whose names also contain
/// every fuzzy fragment.
pub fn filter_names(db: &Database, names: &[String], fuzzy: &[String], slots: Vec<Slot>) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| {
            db.record(*slot).is_some_and(|r| {
                (names.is_empty() || names.contains(&r.name))
                    && fuzzy.iter().all(|fragment| r.name.contains(fragment.as_str()))
            })
        })
        .collect()
}

/// Keep records whose controller owner UID is one of `uids`.
pub fn filter_owner_uid(db: &Database, uids: &[String], slots: Vec<Slot>) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| db.record(*slot).is_some_and(|r| uids.contains(&r.owner_uid)))
        .collect()
}

pub fn filter_labels(ctx: &mut FilterContext<'_>, selector: &Selector, slots: Vec<Slot>) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| {
            ctx.candidate_payload(*slot).is_some_and(|object| {
                let labels = object
                    .pointer("/metadata/labels")
                    .and_then(Value::as_object);
                selector.matches(|key| labels.and_then(|l| l.get(key)).and_then(Value::as_str))
            })
        })
        .collect()
}

pub fn filter_fields(ctx: &mut FilterContext<'_>, selector: &Selector, slots: Vec<Slot>) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| {
            ctx.candidate_payload(*slot).is_some_and(|object| {
                selector
                    .requirements()
                    .iter()
                    .all(|r| r.matches(resolve_field(object, r.key()).as_deref()))
            })
        })
        .collect()
}

/// Walk a dotted path (`status.phase`) through nested maps and render the
/// scalar at the end. Missing segments and non-scalar terminals yield
/// `None`.
pub fn resolve_field(object: &Value, path: &str) -> Option<String> {
    let mut current = object;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
