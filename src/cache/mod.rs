mod file_store;

pub use file_store::CacheStore;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Semantic key for the "actual start" date custom field.
pub const ACT_START: &str = "act.start";
/// Semantic key for the "actual finish" date custom field.
pub const ACT_FINISH: &str = "act.finish";

/// Instance-specific identifiers resolved from the tracker.
///
/// A cache that exists always has non-empty `statuses` and `activities`
/// and a `default_activity_id` taken from `activities`. `custom_fields`
/// is filled in later, the first time a completed transition needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCache {
    /// Normalized status name -> status ID
    pub statuses: BTreeMap<String, u64>,
    /// Normalized activity name -> activity ID (active activities only)
    pub activities: BTreeMap<String, u64>,
    pub default_activity_id: u64,
    /// Normalized names of statuses that close an issue
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub closed_statuses: BTreeSet<String>,
    /// Semantic key (`act.start`, `act.finish`) -> custom field ID
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, u64>,
}

impl MetadataCache {
    /// Whether the cache satisfies the bootstrap invariant.
    pub fn is_complete(&self) -> bool {
        !self.statuses.is_empty()
            && !self.activities.is_empty()
            && self.activities.values().any(|id| *id == self.default_activity_id)
    }

    pub fn status_id(&self, normalized: &str) -> Option<u64> {
        self.statuses.get(normalized).copied()
    }

    pub fn is_closed(&self, normalized: &str) -> bool {
        self.closed_statuses.contains(normalized)
    }

    pub fn activity_id(&self, normalized: &str) -> Option<u64> {
        self.activities.get(normalized).copied()
    }

    /// Known status keys in lexical order.
    pub fn status_names(&self) -> Vec<String> {
        self.statuses.keys().cloned().collect()
    }

    pub fn activity_names(&self) -> Vec<String> {
        self.activities.keys().cloned().collect()
    }

    /// Name of the default activity, if it is still among `activities`.
    pub fn default_activity_name(&self) -> Option<&str> {
        self.activities
            .iter()
            .find(|(_, id)| **id == self.default_activity_id)
            .map(|(name, _)| name.as_str())
    }
}
