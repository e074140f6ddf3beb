//! Deterministic ID allocation.
//!
//! IDs are a durability contract: anything serialized by ID (binary layouts,
//! save files, network snapshots) breaks if an ID silently changes. The
//! allocator is therefore a pure function of the candidate set and the manual
//! ID requests:
//!
//! 1. Manual requests are honored first and reserved before any auto slot is
//!    handed out. Requests shared by several candidates are dropped as a group.
//! 2. Remaining candidates are sorted with a kind-specific comparator and each
//!    takes the smallest unused non-negative ID.
//! 3. If the highest assigned ID exceeds the configured maximum, the whole
//!    kind is rejected.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ecsgen_decl::{DeclKind, Diagnostic, DiagnosticCode, Outcome, TypeDeclaration};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

/// How an ID was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    Manual,
    Auto,
}

/// An ID assigned to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocatedId<'a> {
    /// The declaration this ID belongs to. Serialized as its name.
    #[serde(rename = "name", serialize_with = "serialize_owner")]
    pub owner: &'a TypeDeclaration,
    pub value: u32,
    pub source: IdSource,
}

fn serialize_owner<S: Serializer>(owner: &&TypeDeclaration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&owner.name)
}

impl AllocatedId<'_> {
    /// Fully-qualified name of the owning declaration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.owner.name
    }
}

/// Ordering for auto-assigned candidates of `kind`.
///
/// Components sort by alignment descending so widely-aligned types get the
/// low IDs and pack first; everything else sorts by name only.
fn auto_order(kind: DeclKind, a: &TypeDeclaration, b: &TypeDeclaration) -> Ordering {
    match kind {
        DeclKind::Component => b
            .alignment
            .cmp(&a.alignment)
            .then_with(|| a.name.cmp(&b.name)),
        DeclKind::Tag | DeclKind::Queryable | DeclKind::System => a.name.cmp(&b.name),
    }
}

/// Assign IDs to the validated candidates of one kind.
///
/// The result lists IDs in ascending order. Duplicate manual requests yield
/// [`Outcome::PartialOk`] without the conflicting candidates; exceeding
/// `max_id` yields [`Outcome::Rejected`].
#[must_use]
pub fn allocate<'a>(
    candidates: &[&'a TypeDeclaration],
    kind: DeclKind,
    max_id: u32,
) -> Outcome<Vec<AllocatedId<'a>>> {
    let mut diagnostics = Vec::new();
    let mut manual: BTreeMap<u32, Vec<&'a TypeDeclaration>> = BTreeMap::new();
    let mut auto: Vec<&'a TypeDeclaration> = Vec::new();

    for &candidate in candidates {
        match candidate.manual_id {
            Some(id) => manual.entry(id).or_default().push(candidate),
            None => auto.push(candidate),
        }
    }

    let mut used: BTreeSet<u32> = BTreeSet::new();
    let mut allocated: Vec<AllocatedId<'a>> = Vec::with_capacity(candidates.len());

    for (id, group) in manual {
        if let &[owner] = group.as_slice() {
            used.insert(id);
            allocated.push(AllocatedId {
                owner,
                value: id,
                source: IdSource::Manual,
            });
        } else {
            let mut names: Vec<&str> = group.iter().map(|d| d.name.as_str()).collect();
            names.sort_unstable();
            warn!(kind = %kind, id, members = names.len(), "duplicate manual ID");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DuplicateId,
                    format!(
                        "manual {kind} ID {id} is requested by {}; none of them receive an ID",
                        names.join(", ")
                    ),
                )
                .at(group.iter().find_map(|d| d.location.as_ref())),
            );
        }
    }

    auto.sort_by(|a, b| auto_order(kind, a, b));

    // `used` only grows and each auto ID is the smallest free slot, so the
    // scan position never has to move backwards.
    let mut next: u32 = 0;
    let mut overflowed = false;
    for owner in auto {
        while used.contains(&next) {
            match next.checked_add(1) {
                Some(n) => next = n,
                None => {
                    overflowed = true;
                    break;
                }
            }
        }
        if overflowed {
            break;
        }
        used.insert(next);
        allocated.push(AllocatedId {
            owner,
            value: next,
            source: IdSource::Auto,
        });
    }

    let max_assigned = used.last().copied();
    if overflowed || max_assigned.is_some_and(|max| max > max_id) {
        let highest = max_assigned.unwrap_or(u32::MAX);
        warn!(kind = %kind, highest, max_id, "ID capacity exceeded; rejecting kind");
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::CapacityExceeded,
            format!(
                "{kind} IDs exceed the maximum: highest assigned ID is {highest}, maximum is {max_id}; no {kind} IDs are generated"
            ),
        ));
        return Outcome::Rejected(diagnostics);
    }

    allocated.sort_by_key(|id| id.value);
    debug!(kind = %kind, count = allocated.len(), ?max_assigned, "allocated IDs");
    Outcome::from_parts(allocated, diagnostics)
}
