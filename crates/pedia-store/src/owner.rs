//! Owner-name chain resolution.
//!
//! Answers "which objects descend from an owner named X, N levels up". Each
//! hop reads the `ownerReferences` of the current owner set and resolves the
//! referenced names to records. Resolution is by name only, within the
//! storage's [`OwnerScope`]: `Global` scans every live record (the first
//! match in slot order wins), `Cluster` and `Namespace` restrict the scan to
//! the subject's cluster or cluster+namespace.
//!
//! Seniority semantics:
//! - `0`: the subject's own `ownerReferences` must name X.
//! - `n >= 1`: after `n` hops, the resolved owner set must contain a record
//!   named X.
//!
//! `0` and `1` select the same generation, the subject's direct owners.
//! They differ only in that `1` needs the named owner to exist as a record
//! within scope, while `0` trusts the reference alone. `2` reaches the
//! grandparent, `3` the great-grandparent, and so on.
//!
//! The subject is what ends up in the result, never the ancestor.

use tracing::debug;

use crate::filter::FilterContext;
use crate::record::{Slot, owner_reference_names};

/// A subject and the owners reached so far on its way up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChain {
    pub subject: Slot,
    pub owners: Vec<Slot>,
}

impl OwnerChain {
    pub fn new(subject: Slot) -> Self {
        Self {
            subject,
            owners: vec![subject],
        }
    }
}

/// Move every chain one hop up. Owners that do not decode, and references
/// that do not resolve, fall out of the chain.
pub fn resolve_owners(ctx: &mut FilterContext<'_>, chains: Vec<OwnerChain>) -> Vec<OwnerChain> {
    let db = ctx.db;
    let scope = ctx.owner_scope;
    chains
        .into_iter()
        .map(|chain| {
            let Some(subject) = db.record(chain.subject) else {
                return OwnerChain {
                    subject: chain.subject,
                    owners: Vec::new(),
                };
            };
            let mut owners = Vec::new();
            for owner in &chain.owners {
                let payload = if *owner == chain.subject {
                    ctx.candidate_payload(*owner)
                } else {
                    ctx.payload(*owner)
                };
                let Some(payload) = payload else {
                    continue;
                };
                let names: Vec<String> = owner_reference_names(payload)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                for name in names {
                    match db.find_by_name(&name, subject, scope) {
                        Some(slot) if !owners.contains(&slot) => owners.push(slot),
                        Some(_) => {}
                        None => debug!(
                            subject = %subject.key(),
                            owner = %name,
                            "owner reference does not resolve"
                        ),
                    }
                }
            }
            OwnerChain {
                subject: chain.subject,
                owners,
            }
        })
        .collect()
}

/// Keep subjects whose ancestor `seniority` levels up is named `name`.
pub fn filter_by_owner_name(
    ctx: &mut FilterContext<'_>,
    name: &str,
    seniority: u32,
    slots: Vec<Slot>,
) -> Vec<Slot> {
    if seniority == 0 {
        return slots
            .into_iter()
            .filter(|slot| {
                ctx.candidate_payload(*slot)
                    .is_some_and(|payload| owner_reference_names(payload).contains(&name))
            })
            .collect();
    }

    let mut chains: Vec<OwnerChain> = slots.into_iter().map(OwnerChain::new).collect();
    for _ in 0..seniority {
        chains = resolve_owners(ctx, chains);
        chains.retain(|chain| !chain.owners.is_empty());
        if chains.is_empty() {
            break;
        }
    }

    let db = ctx.db;
    chains
        .into_iter()
        .filter(|chain| {
            chain
                .owners
                .iter()
                .any(|owner| db.record(*owner).is_some_and(|r| r.name == name))
        })
        .map(|chain| chain.subject)
        .collect()
}
