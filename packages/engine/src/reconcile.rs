//! Identity-keyed reconciliation of consecutive fetches.
//!
//! Incidents have no explicit delete: absence from a fetch result *is*
//! deletion. The reconciler diffs each payload against the previously
//! known set and emits a changeset the presentation layer can apply as
//! create/refresh/destroy instructions.

use std::collections::{BTreeMap, BTreeSet};

use citizen_watch_incident_models::RawIncident;
use serde::Serialize;

/// The identity keys that changed between two consecutive fetches.
///
/// The three sets are pairwise disjoint: a key present after
/// reconciliation lands in `created` or `updated` (never both), and a
/// key that disappeared lands in `removed` exactly once. Unchanged
/// records appear in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Keys seen for the first time.
    pub created: BTreeSet<String>,
    /// Keys whose record changed since the previous fetch.
    pub updated: BTreeSet<String>,
    /// Keys that left the feed.
    pub removed: BTreeSet<String>,
}

impl ChangeSet {
    /// `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Holds the previously known incident set and diffs new fetches
/// against it.
///
/// Owned by a single caller (the poller); never reconciles two payloads
/// concurrently.
#[derive(Debug, Default)]
pub struct Reconciler {
    known: BTreeMap<String, RawIncident>,
}

impl Reconciler {
    /// Creates a reconciler with an empty known set, as on process
    /// start: the first fetch reports every incident as created.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `fetched` against the known set and replaces the known set
    /// with the fetched mapping in full.
    ///
    /// Duplicate keys in one payload should not occur; when they do,
    /// the last occurrence wins. Never fails, and is deterministic for
    /// identical inputs.
    pub fn reconcile(&mut self, fetched: &[RawIncident]) -> ChangeSet {
        let mut next: BTreeMap<String, RawIncident> = BTreeMap::new();
        for incident in fetched {
            next.insert(incident.key.clone(), incident.clone());
        }

        let mut changes = ChangeSet::default();

        for key in self.known.keys() {
            if !next.contains_key(key) {
                changes.removed.insert(key.clone());
            }
        }

        for (key, incident) in &next {
            match self.known.get(key) {
                None => {
                    changes.created.insert(key.clone());
                }
                Some(prior) if has_changed(prior, incident) => {
                    changes.updated.insert(key.clone());
                }
                Some(_) => {}
            }
        }

        // Wholesale swap keeps the known set exactly equal to the
        // latest payload's key set regardless of prior state.
        self.known = next;
        changes
    }

    /// Identity keys currently known, in sorted order.
    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.known.keys().map(String::as_str)
    }

    /// Number of incidents currently known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// `true` when no incidents are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Cheap differentiators first; the full comparison catches records
/// edited without a new update entry or timestamp bump.
fn has_changed(prior: &RawIncident, current: &RawIncident) -> bool {
    prior.updated_ms != current.updated_ms
        || prior.updates.len() != current.updates.len()
        || prior != current
}
