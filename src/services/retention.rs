//! # Retention Engine
//!
//! Enforces retention policy over the store. Every operation is explicit and
//! externally triggerable, via schedule or administrative call; nothing here
//! runs implicitly. Eviction marks a version stale and drops its cached
//! payloads but keeps the record; deletion physically removes it; deprecation
//! marks a version no longer published upstream.
//!
//! The sweep operations return `true` on normal completion regardless of how
//! many records were affected; their failures surface through logs, not the
//! return value. Callers needing per-item failure detail use the
//! response-returning operations.

use crate::config::ArtifactsRetentionPolicyConfig;
use crate::error::Result;
use crate::models::{
    Coordinate, MetadataNotificationResponse, ProjectCoordinate, StoreProjectVersionData,
    VersionId,
};
use crate::repository::RepositoryClient;
use crate::store::MetadataStore;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct ArtifactsPurgeService {
    store: Arc<dyn MetadataStore>,
    repository: Arc<dyn RepositoryClient>,
    retention: ArtifactsRetentionPolicyConfig,
}

impl ArtifactsPurgeService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        repository: Arc<dyn RepositoryClient>,
        retention: ArtifactsRetentionPolicyConfig,
    ) -> Self {
        Self {
            store,
            repository,
            retention,
        }
    }

    /// TTL-aged eviction sweep. Fixed releases and snapshots age against
    /// separate TTLs; the sweep also trims each project down to the configured
    /// maximum snapshot count, oldest first.
    #[instrument(skip(self))]
    pub async fn evict_least_recently_used(
        &self,
        ttl_for_versions_in_days: i64,
        ttl_for_snapshots_in_days: i64,
    ) -> Result<bool> {
        let now = Utc::now();
        let mut evicted_count = 0usize;

        let projects = match self.store.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                error!("LRU sweep cannot list projects: {}", e);
                return Ok(true);
            }
        };

        for project in projects {
            let records = match self.store.list_version_data(&project.coordinate).await {
                Ok(records) => records,
                Err(e) => {
                    error!(project = %project.coordinate, "LRU sweep cannot list versions: {}", e);
                    continue;
                }
            };

            let mut live_snapshots: Vec<&StoreProjectVersionData> = Vec::new();
            for record in &records {
                if record.evicted {
                    continue;
                }
                let ttl = if record.coordinate.is_snapshot() {
                    ttl_for_snapshots_in_days
                } else {
                    ttl_for_versions_in_days
                };
                if record.idle_days(now) > ttl {
                    if self.evict_record(record.clone()).await {
                        evicted_count += 1;
                    }
                } else if record.coordinate.is_snapshot() {
                    live_snapshots.push(record);
                }
            }

            // Oldest snapshots beyond the allowed count go too, by refresh
            // recency.
            if live_snapshots.len() > self.retention.maximum_snapshots_allowed {
                live_snapshots.sort_by_key(|record| record.last_refreshed);
                let excess = live_snapshots.len() - self.retention.maximum_snapshots_allowed;
                for record in live_snapshots.into_iter().take(excess) {
                    if self.evict_record(record.clone()).await {
                        evicted_count += 1;
                    }
                }
            }
        }

        info!(evicted_count, "LRU eviction sweep completed");
        Ok(true)
    }

    /// Mark as deprecated every cached version no longer published upstream.
    #[instrument(skip(self))]
    pub async fn deprecate_versions_not_in_repository(&self) -> Result<bool> {
        let mut deprecated_count = 0usize;

        let projects = match self.store.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                error!("Deprecation sweep cannot list projects: {}", e);
                return Ok(true);
            }
        };

        for project in projects {
            let published: BTreeSet<String> =
                match self.repository.list_versions(&project.coordinate).await {
                    Ok(versions) => versions.into_iter().collect(),
                    Err(e) => {
                        warn!(
                            project = %project.coordinate,
                            "Deprecation sweep cannot list repository versions: {}", e
                        );
                        continue;
                    }
                };
            let records = match self.store.list_version_data(&project.coordinate).await {
                Ok(records) => records,
                Err(e) => {
                    error!(project = %project.coordinate, "Deprecation sweep cannot list versions: {}", e);
                    continue;
                }
            };

            for mut record in records {
                if record.evicted
                    || record.deprecated
                    || published.contains(&record.coordinate.version_id)
                {
                    continue;
                }
                record.deprecated = true;
                let coordinate = record.coordinate.clone();
                match self.store.upsert_version_data(record).await {
                    Ok(()) => {
                        debug!(coordinate = %coordinate, "Version deprecated");
                        deprecated_count += 1;
                    }
                    Err(e) => {
                        error!(coordinate = %coordinate, "Cannot deprecate version: {}", e)
                    }
                }
            }
        }

        info!(deprecated_count, "Deprecation sweep completed");
        Ok(true)
    }

    /// Keep only the `versions_to_keep` most recent fixed releases of one
    /// project, evicting the rest. Zero evicts every fixed release; snapshots
    /// are never touched.
    #[instrument(skip(self))]
    pub async fn evict_oldest_project_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        versions_to_keep: usize,
    ) -> MetadataNotificationResponse {
        let project = ProjectCoordinate::new(group_id, artifact_id);
        let mut response = MetadataNotificationResponse::new();

        let records = match self.store.list_version_data(&project).await {
            Ok(records) => records,
            Err(e) => {
                response.add_error(format!("cannot list versions for {project}: {e}"));
                return response;
            }
        };

        let mut releases: Vec<StoreProjectVersionData> = records
            .into_iter()
            .filter(|record| !record.evicted && !record.coordinate.is_snapshot())
            .collect();
        releases.sort_by(|a, b| {
            VersionId::compare_releases(&a.coordinate.version_id, &b.coordinate.version_id)
        });

        if releases.len() <= versions_to_keep {
            response.add_message(format!(
                "project {project} has {} fixed releases, nothing to evict",
                releases.len()
            ));
            return response;
        }

        let excess = releases.len() - versions_to_keep;
        for record in releases.into_iter().take(excess) {
            let coordinate = record.coordinate.clone();
            if self.evict_record(record).await {
                response.add_message(format!("evicted {coordinate}"));
            } else {
                response.add_error(format!("cannot evict {coordinate}"));
            }
        }
        response
    }

    /// Mark one coordinate evicted and drop its cached payloads.
    #[instrument(skip(self))]
    pub async fn evict(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> MetadataNotificationResponse {
        let coordinate = Coordinate::new(group_id, artifact_id, version_id);
        let mut response = MetadataNotificationResponse::new();

        match self.store.get_version_data(&coordinate).await {
            Ok(Some(record)) => {
                if self.evict_record(record).await {
                    response.add_message(format!("evicted {coordinate}"));
                } else {
                    response.add_error(format!("cannot evict {coordinate}"));
                }
            }
            Ok(None) => {
                response.add_error(format!("version {coordinate} not found in store"));
            }
            Err(e) => {
                response.add_error(format!("cannot read store record for {coordinate}: {e}"));
            }
        }
        response
    }

    /// Physically remove one coordinate's cached data.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> MetadataNotificationResponse {
        let coordinate = Coordinate::new(group_id, artifact_id, version_id);
        let mut response = MetadataNotificationResponse::new();
        match self.store.delete_version_data(&coordinate).await {
            Ok(()) => {
                response.add_message(format!("deleted {coordinate}"));
            }
            Err(e) => {
                response.add_error(format!("cannot delete {coordinate}: {e}"));
            }
        }
        response
    }

    /// Batch physical delete of named snapshot versions. Returns a
    /// human-readable summary; a non-snapshot identifier is refused.
    #[instrument(skip(self))]
    pub async fn delete_snapshot_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_ids: Vec<String>,
    ) -> String {
        let mut lines = Vec::with_capacity(version_ids.len());
        for version_id in version_ids {
            let coordinate = Coordinate::new(group_id, artifact_id, version_id.clone());
            if !VersionId::is_snapshot(&version_id) {
                lines.push(format!("refused '{version_id}': not a snapshot version"));
                continue;
            }
            match self.store.get_version_data(&coordinate).await {
                Ok(Some(_)) => match self.store.delete_version_data(&coordinate).await {
                    Ok(()) => lines.push(format!("deleted '{version_id}'")),
                    Err(e) => lines.push(format!("failed to delete '{version_id}': {e}")),
                },
                Ok(None) => lines.push(format!("skipped '{version_id}': not found in store")),
                Err(e) => lines.push(format!("failed to delete '{version_id}': {e}")),
            }
        }
        format!(
            "snapshot deletion for {group_id}:{artifact_id}: {}",
            lines.join("; ")
        )
    }

    /// Mark one version as deprecated.
    #[instrument(skip(self))]
    pub async fn deprecate(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> MetadataNotificationResponse {
        let coordinate = Coordinate::new(group_id, artifact_id, version_id);
        let mut response = MetadataNotificationResponse::new();

        match self.store.get_version_data(&coordinate).await {
            Ok(Some(mut record)) => {
                record.deprecated = true;
                match self.store.upsert_version_data(record).await {
                    Ok(()) => {
                        response.add_message(format!("deprecated {coordinate}"));
                    }
                    Err(e) => {
                        response.add_error(format!("cannot deprecate {coordinate}: {e}"));
                    }
                }
            }
            Ok(None) => {
                response.add_error(format!("version {coordinate} not found in store"));
            }
            Err(e) => {
                response.add_error(format!("cannot read store record for {coordinate}: {e}"));
            }
        }
        response
    }

    /// Evict versions with no recorded access ever, distinct from the
    /// TTL-aged sweep.
    #[instrument(skip(self))]
    pub async fn evict_versions_not_used(&self) -> MetadataNotificationResponse {
        let mut response = MetadataNotificationResponse::new();
        let projects = match self.store.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                response.add_error(format!("cannot list depot projects: {e}"));
                return response;
            }
        };

        for project in projects {
            let records = match self.store.list_version_data(&project.coordinate).await {
                Ok(records) => records,
                Err(e) => {
                    response.add_error(format!(
                        "cannot list versions for {}: {e}",
                        project.coordinate
                    ));
                    continue;
                }
            };
            for record in records {
                if record.evicted || record.last_accessed.is_some() {
                    continue;
                }
                let coordinate = record.coordinate.clone();
                if self.evict_record(record).await {
                    response.add_message(format!("evicted never-used {coordinate}"));
                } else {
                    response.add_error(format!("cannot evict {coordinate}"));
                }
            }
        }
        response
    }

    /// Flag the record, drop its payloads. Returns whether both writes stuck.
    async fn evict_record(&self, mut record: StoreProjectVersionData) -> bool {
        record.evicted = true;
        let coordinate = record.coordinate.clone();
        if let Err(e) = self.store.upsert_version_data(record).await {
            error!(coordinate = %coordinate, "Cannot mark version evicted: {}", e);
            return false;
        }
        if let Err(e) = self.store.delete_entities(&coordinate).await {
            error!(coordinate = %coordinate, "Cannot drop evicted payloads: {}", e);
            return false;
        }
        debug!(coordinate = %coordinate, "Version evicted");
        true
    }
}
