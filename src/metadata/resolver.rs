use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::normalize::{classify_custom_field, normalize_activity_name, normalize_status_name};
use crate::cache::{CacheStore, MetadataCache};
use crate::entity::{IssueEnvelope, IssueStatus, IssueStatusList, TimeEntryActivity, TimeEntryActivityList};
use crate::error::{RedmineError, Result};
use crate::transport::Transport;

const STATUSES_PATH: &str = "/issue_statuses.json";
const ACTIVITIES_PATH: &str = "/enumerations/time_entry_activities.json";
const PREFERRED_ACTIVITY: &str = "development";

/// Resolves tracker names to IDs, fetching and persisting the mapping the
/// first time it is needed.
#[derive(Clone)]
pub struct MetadataResolver {
    transport: Arc<dyn Transport>,
    store: CacheStore,
}

impl MetadataResolver {
    pub fn new(transport: Arc<dyn Transport>, store: CacheStore) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Return the persisted cache, bootstrapping it from the tracker when
    /// none exists.
    ///
    /// A warm cache costs no network calls. A cold one costs exactly two;
    /// if either fails nothing is written and the error propagates.
    pub async fn ensure_metadata(&self) -> Result<MetadataCache> {
        if let Some(cache) = self.store.load() {
            tracing::debug!("metadata cache hit");
            return Ok(cache);
        }

        tracing::info!("metadata cache missing, fetching statuses and activities");
        let statuses: IssueStatusList = serde_json::from_value(self.transport.get(STATUSES_PATH).await?)?;
        let activities: TimeEntryActivityList =
            serde_json::from_value(self.transport.get(ACTIVITIES_PATH).await?)?;

        let cache = build_cache(&statuses.issue_statuses, &activities.time_entry_activities)?;
        self.store.save(&cache)?;
        tracing::info!(
            statuses = cache.statuses.len(),
            activities = cache.activities.len(),
            default_activity_id = cache.default_activity_id,
            "metadata cache written"
        );
        Ok(cache)
    }

    /// Find the IDs of the actual start/finish custom fields.
    ///
    /// Uses `cache.custom_fields` when already known. Otherwise inspects
    /// `issue_id`, records whatever it finds in the cache and persists it.
    /// Never fails: a fetch error or an issue without matching fields yields
    /// an empty map.
    pub async fn resolve_custom_fields(
        &self,
        issue_id: u64,
        cache: &mut MetadataCache,
    ) -> BTreeMap<String, u64> {
        if !cache.custom_fields.is_empty() {
            return cache.custom_fields.clone();
        }

        let found = match self.discover_custom_fields(issue_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(issue_id, error = %e, "custom field discovery failed");
                return BTreeMap::new();
            }
        };

        if found.is_empty() {
            tracing::debug!(issue_id, "no actual date custom fields on issue");
            return found;
        }

        cache.custom_fields.extend(found.clone());
        if let Err(e) = self.store.save(cache) {
            tracing::warn!(error = %e, "could not persist discovered custom fields");
        } else {
            tracing::info!(fields = ?found, "custom fields discovered");
        }
        found
    }

    /// Remove the persisted cache so the next lookup bootstraps again.
    pub fn clear(&self) -> Result<bool> {
        self.store.clear()
    }

    async fn discover_custom_fields(&self, issue_id: u64) -> Result<BTreeMap<String, u64>> {
        let envelope: IssueEnvelope =
            serde_json::from_value(self.transport.get(&format!("/issues/{}.json", issue_id)).await?)?;

        let mut found = BTreeMap::new();
        for field in &envelope.issue.custom_fields {
            // Later fields win when two names classify to the same key.
            if let Some(key) = classify_custom_field(&field.name) {
                found.insert(key.to_string(), field.id);
            }
        }
        Ok(found)
    }
}

/// Assemble a cache from the tracker's enumerations.
///
/// Inactive activities are dropped. The default activity is
/// "development" when present, else the lowest remaining ID.
pub fn build_cache(statuses: &[IssueStatus], activities: &[TimeEntryActivity]) -> Result<MetadataCache> {
    let closed_statuses: BTreeSet<String> = statuses
        .iter()
        .filter(|s| s.is_closed)
        .map(|s| normalize_status_name(&s.name))
        .collect();
    let statuses: BTreeMap<String, u64> = statuses
        .iter()
        .map(|s| (normalize_status_name(&s.name), s.id))
        .collect();

    let activities: BTreeMap<String, u64> = activities
        .iter()
        .filter(|a| a.active)
        .map(|a| (normalize_activity_name(&a.name), a.id))
        .collect();

    if statuses.is_empty() {
        return Err(RedmineError::Metadata("tracker returned no issue statuses".to_string()));
    }

    let default_activity_id = activities
        .get(PREFERRED_ACTIVITY)
        .copied()
        .or_else(|| activities.values().min().copied())
        .ok_or_else(|| RedmineError::Metadata("tracker has no active time entry activities".to_string()))?;

    Ok(MetadataCache {
        statuses,
        activities,
        default_activity_id,
        closed_statuses,
        custom_fields: BTreeMap::new(),
    })
}
