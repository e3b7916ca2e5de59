//! # Per-Coordinate Store Records and Reconciliation Reports
//!
//! `StoreProjectVersionData` is the depot's record for one coordinate: created
//! on first successful refresh, mutated by the refresh engine (timestamps), the
//! dependency resolver (transitive report) and the retention engine
//! (evicted/deprecated flags). `VersionMismatch` is the per-project output of a
//! reconciliation pass; it is a report, never persisted.

use crate::models::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Transitive dependency set for one coordinate, with per-edge resolution
/// errors recorded instead of aborting the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub dependencies: BTreeSet<Coordinate>,
    pub errors: Vec<String>,
}

impl DependencyReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The depot's record for one cached coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProjectVersionData {
    pub coordinate: Coordinate,
    pub evicted: bool,
    pub deprecated: bool,
    /// Drives LRU eviction. `None` means the version was refreshed but never
    /// read back, which the never-used sweep targets.
    pub last_accessed: Option<DateTime<Utc>>,
    pub last_refreshed: DateTime<Utc>,
    pub transitive_dependencies_report: Option<DependencyReport>,
    /// Causing event of the refresh that produced this record state.
    pub refreshed_by: String,
    /// Last seen upstream checksum per artifact type, for the cheap change
    /// check a non-full refresh uses to skip unchanged artifacts.
    pub artifact_checksums: BTreeMap<String, String>,
}

impl StoreProjectVersionData {
    pub fn new(coordinate: Coordinate, causing_event: &str) -> Self {
        Self {
            coordinate,
            evicted: false,
            deprecated: false,
            last_accessed: None,
            last_refreshed: Utc::now(),
            transitive_dependencies_report: None,
            refreshed_by: causing_event.to_string(),
            artifact_checksums: BTreeMap::new(),
        }
    }

    pub fn mark_refreshed(&mut self, causing_event: &str) {
        self.evicted = false;
        self.last_refreshed = Utc::now();
        self.refreshed_by = causing_event.to_string();
    }

    pub fn mark_accessed(&mut self) {
        self.last_accessed = Some(Utc::now());
    }

    /// Age of the record since it was last touched, in whole days. Access
    /// recency wins over refresh recency.
    pub fn idle_days(&self, now: DateTime<Utc>) -> i64 {
        let reference = self.last_accessed.unwrap_or(self.last_refreshed);
        (now - reference).num_days()
    }
}

/// Per-project drift between the repository's version listing and the store's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMismatch {
    pub project_id: String,
    pub group_id: String,
    pub artifact_id: String,
    /// Present upstream, missing in the cache.
    pub versions_not_in_store: Vec<String>,
    /// Cached, but no longer published upstream.
    pub versions_not_in_repository: Vec<String>,
    /// Collection failures hit while diffing this project.
    pub errors: Vec<String>,
}

impl VersionMismatch {
    pub fn has_drift(&self) -> bool {
        !self.versions_not_in_store.is_empty() || !self.versions_not_in_repository.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_is_live() {
        let data = StoreProjectVersionData::new(
            Coordinate::new("com.example", "test-artifact", "1.0.0"),
            "test-event",
        );
        assert!(!data.evicted);
        assert!(!data.deprecated);
        assert!(data.last_accessed.is_none());
        assert_eq!(data.refreshed_by, "test-event");
    }

    #[test]
    fn test_mark_refreshed_clears_eviction() {
        let mut data = StoreProjectVersionData::new(
            Coordinate::new("com.example", "test-artifact", "1.0.0"),
            "test-event",
        );
        data.evicted = true;
        data.mark_refreshed("later-event");
        assert!(!data.evicted);
        assert_eq!(data.refreshed_by, "later-event");
    }

    #[test]
    fn test_idle_days_prefers_access_time() {
        let mut data = StoreProjectVersionData::new(
            Coordinate::new("com.example", "test-artifact", "1.0.0"),
            "test-event",
        );
        let now = Utc::now();
        data.last_refreshed = now - Duration::days(30);
        assert_eq!(data.idle_days(now), 30);

        data.last_accessed = Some(now - Duration::days(3));
        assert_eq!(data.idle_days(now), 3);
    }

    #[test]
    fn test_mismatch_drift_detection() {
        let mut mismatch = VersionMismatch {
            project_id: "PROD-1".to_string(),
            group_id: "com.example".to_string(),
            artifact_id: "test-artifact".to_string(),
            ..VersionMismatch::default()
        };
        assert!(!mismatch.has_drift());
        mismatch.versions_not_in_store.push("2.0.0".to_string());
        assert!(mismatch.has_drift());
    }
}
