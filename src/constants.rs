//! # System Constants
//!
//! Schedule names, causing-event tags, metric names and interval constants.
//! These strings are significant for metrics and log correlation across a
//! deployment; changing one silently breaks dashboards, so they live in one
//! place rather than inline at call sites.

/// One minute in milliseconds.
pub const MINUTE: u64 = 60_000;

/// One hour in milliseconds.
pub const HOUR: u64 = 60 * MINUTE;

/// Version suffix marking a floating snapshot.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// The default branch snapshot refreshed by the frequent-cadence sweep.
pub const MASTER_SNAPSHOT: &str = "master-SNAPSHOT";

/// Bounded retry count for store writes before the failure is reported as a
/// per-coordinate error.
pub const STORE_WRITE_RETRIES: u32 = 3;

/// Named recurring schedules. Each name identifies one registered job across
/// the fleet and is carried as the causing event of the work it triggers.
pub mod schedules {
    /// Fleet-wide default-snapshot refresh, fired on every node (the refresh
    /// itself is deduplicated per coordinate).
    pub const REFRESH_ALL_VERSION_ARTIFACTS: &str = "REFRESH_ALL_VERSION_ARTIFACTS_SCHEDULE";

    /// Single-instance LRU eviction sweep.
    pub const EVICT_LRU_PROJECT_VERSIONS: &str = "evict-LRU-project-versions";

    /// Single-instance deprecation sweep for versions gone from upstream.
    pub const DEPRECATE_VERSIONS_NOT_IN_REPOSITORY: &str = "deprecate-versions-notInRepository";

    /// Every-node reconciliation metrics collection.
    pub const REPOSITORY_METRICS: &str = "repository-metrics-schedule";

    /// Every-node latest-version pointer sync.
    pub const SYNC_PROJECT_LATEST_VERSIONS: &str = "sync-project-latest-versions-schedule";
}

/// Causing-event tags for operations initiated outside a schedule, plus the
/// derivation rule for nested operations.
pub mod events {
    /// Tag for direct administrative/API-triggered dependency resolution.
    pub const UPDATE_TRANSITIVE_DEPENDENCIES: &str = "UPDATE_TRANSITIVE_DEPENDENCIES";

    /// Derive the tag a nested operation carries so audit logs can reconstruct
    /// the full trigger chain ("why did this fetch happen").
    pub fn child_event(parent: &str, operation: &str) -> String {
        format!("{parent}>{operation}")
    }
}

/// Metric names registered with the metrics collaborator.
pub mod metrics {
    /// Counter incremented once per coordinate refresh.
    pub const VERSION_REFRESH: &str = "versionRefresh";

    /// Histogram of per-coordinate refresh durations in milliseconds.
    pub const VERSION_REFRESH_DURATION: &str = "versionRefresh_duration";

    /// Gauges derived from each reconciliation pass.
    pub const PROJECTS: &str = "PROJECTS";
    pub const REPO_VERSIONS: &str = "REPO_VERSIONS";
    pub const STORE_VERSIONS: &str = "STORE_VERSIONS";
    pub const MISSING_REPO_VERSIONS: &str = "MISSING_REPO_VERSIONS";
    pub const MISSING_STORE_VERSIONS: &str = "MISSING_STORE_VERSIONS";
    pub const REPO_EXCEPTIONS: &str = "REPO_EXCEPTIONS";
    pub const PROJECT_UPDATE_EXCEPTIONS: &str = "PROJECT_UPDATE_EXCEPTIONS";
}

/// Authorization resource names the thin resource layer checks before
/// forwarding into the core.
pub mod auth_resources {
    pub const ARTIFACTS_REFRESH: &str = "ArtifactsRefresh";
    pub const ARTIFACTS_PURGE: &str = "ArtifactsPurge";
    pub const REPOSITORY: &str = "Repository";
}
