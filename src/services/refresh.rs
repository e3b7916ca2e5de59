//! # Artifact Refresh Engine
//!
//! Pulls current metadata for one or more coordinates from the upstream
//! repository, runs the type-specific handler over the fetched files and
//! writes the result into the store. Concurrency contract: at most one
//! in-flight refresh per coordinate — a second caller for the same coordinate
//! waits on the coordinate lock and then usually coalesces into the first
//! result via the freshness window instead of re-fetching.
//!
//! Every operation takes a causing event as its last parameter, records it on
//! the refreshed record and derives the tag carried by nested operations, so
//! audit logs can reconstruct why a fetch happened.
//!
//! Failure semantics are accumulate-not-abort: upstream errors, handler
//! errors and exhausted store-write retries become error entries on the
//! returned response; batch operations isolate per-item failures and never
//! abort siblings. A version record exists only once at least one artifact
//! type has been cached successfully; a pass where everything fails leaves
//! the store as it was.

use crate::config::ArtifactsRefreshPolicyConfig;
use crate::constants::{events, metrics, MASTER_SNAPSHOT, STORE_WRITE_RETRIES};
use crate::handlers::ArtifactHandlerRegistry;
use crate::metrics::MetricsClient;
use crate::models::{
    Coordinate, MetadataNotificationResponse, ProjectCoordinate, StoreProjectVersionData,
    StoredEntity, VersionId,
};
use crate::repository::RepositoryClient;
use crate::services::RefreshDependenciesService;
use crate::store::{MetadataStore, StoreProject};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub struct ArtifactsRefreshService {
    store: Arc<dyn MetadataStore>,
    repository: Arc<dyn RepositoryClient>,
    handlers: Arc<ArtifactHandlerRegistry>,
    dependencies: Arc<RefreshDependenciesService>,
    metrics: Arc<dyn MetricsClient>,
    policy: ArtifactsRefreshPolicyConfig,
    /// Per-coordinate locks serializing refreshes for one key. Entries exist
    /// only while a refresh is in flight or waited on.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl ArtifactsRefreshService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        repository: Arc<dyn RepositoryClient>,
        handlers: Arc<ArtifactHandlerRegistry>,
        dependencies: Arc<RefreshDependenciesService>,
        metrics: Arc<dyn MetricsClient>,
        policy: ArtifactsRefreshPolicyConfig,
    ) -> Self {
        Self {
            store,
            repository,
            handlers,
            dependencies,
            metrics,
            policy,
            in_flight: DashMap::new(),
        }
    }

    /// Refresh one coordinate. `full_update` forces a re-fetch and re-parse;
    /// otherwise cheap existence/checksum checks skip unchanged artifacts.
    /// `transitive` chains into dependency resolution after a successful
    /// metadata refresh.
    #[instrument(skip(self))]
    pub async fn refresh_version_for_project(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
        full_update: bool,
        transitive: bool,
        causing_event: &str,
    ) -> MetadataNotificationResponse {
        let coordinate = Coordinate::new(group_id, artifact_id, version_id);
        let mut response = MetadataNotificationResponse::new();

        match self.repository.version_exists(&coordinate).await {
            Ok(true) => {}
            Ok(false) => {
                response.add_error(format!("version {coordinate} not found in repository"));
                return response;
            }
            Err(e) => {
                response.add_error(format!("cannot reach repository for {coordinate}: {e}"));
                return response;
            }
        }

        // Serialize refreshes per coordinate. A second caller parks here and,
        // once the first completes, the freshness check inside usually turns
        // its pass into a no-op rather than a duplicate fetch.
        let key = coordinate.key_string();
        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        self.refresh_locked(&coordinate, full_update, transitive, causing_event, &mut response)
            .await;
        drop(guard);
        drop(lock);
        // Entries with no remaining waiter are dropped so the lock table only
        // tracks coordinates that are actually in flight.
        self.in_flight
            .remove_if(&key, |_, entry| Arc::strong_count(entry) == 1);

        response
    }

    async fn refresh_locked(
        &self,
        coordinate: &Coordinate,
        full_update: bool,
        transitive: bool,
        causing_event: &str,
        response: &mut MetadataNotificationResponse,
    ) {
        let started = Instant::now();
        let existing = match self.store.get_version_data(coordinate).await {
            Ok(existing) => existing,
            Err(e) => {
                response.add_error(format!("cannot read store record for {coordinate}: {e}"));
                return;
            }
        };

        if !full_update {
            if let Some(ref data) = existing {
                let freshness = Duration::milliseconds(
                    self.policy.versions_update_interval_in_millis as i64,
                );
                if !data.evicted && Utc::now() - data.last_refreshed < freshness {
                    debug!(coordinate = %coordinate, "Skipping refresh, recently refreshed");
                    response.add_message(format!(
                        "version {coordinate} skipped, refreshed within update interval"
                    ));
                    return;
                }
            }
        }

        let mut data = existing
            .unwrap_or_else(|| StoreProjectVersionData::new(coordinate.clone(), causing_event));

        let mut refreshed_types = 0usize;
        for artifact_type in self.handlers.registered_types() {
            let type_key = artifact_type.to_string();

            // The checksum is looked up on the full path too, so the next
            // non-full refresh keeps its cheap skip.
            let upstream_checksum = match self
                .repository
                .artifact_checksum(coordinate, artifact_type)
                .await
            {
                Ok(checksum) => checksum,
                Err(e) if full_update => {
                    warn!(
                        coordinate = %coordinate,
                        artifact_type = %type_key,
                        "Checksum lookup failed during full update: {}", e
                    );
                    None
                }
                Err(e) => {
                    response.add_error(format!(
                        "checksum check failed for {coordinate} [{type_key}]: {e}"
                    ));
                    continue;
                }
            };
            if !full_update {
                if let Some(ref checksum) = upstream_checksum {
                    if data.artifact_checksums.get(&type_key) == Some(checksum) {
                        debug!(coordinate = %coordinate, artifact_type = %type_key, "Artifact unchanged");
                        response.add_message(format!(
                            "artifact {coordinate} [{type_key}] unchanged, skipped"
                        ));
                        continue;
                    }
                }
            }

            let files = match self.repository.fetch_artifacts(coordinate, artifact_type).await {
                Ok(files) => files,
                Err(e) => {
                    response.add_error(format!(
                        "fetch failed for {coordinate} [{type_key}]: {e}"
                    ));
                    continue;
                }
            };

            let handler = match self.handlers.get(artifact_type) {
                Ok(handler) => handler,
                Err(e) => {
                    response.add_error(e.to_string());
                    continue;
                }
            };
            let entities = match handler.extract(coordinate, &files).await {
                Ok(entities) => entities,
                Err(e) => {
                    response.add_error(format!(
                        "extraction failed for {coordinate} [{type_key}]: {e}"
                    ));
                    continue;
                }
            };

            if let Err(e) = self.put_entities_with_retry(coordinate, entities).await {
                response.add_error(format!(
                    "store write failed for {coordinate} [{type_key}]: {e}"
                ));
                continue;
            }

            if let Some(checksum) = upstream_checksum {
                data.artifact_checksums.insert(type_key.clone(), checksum);
            } else {
                data.artifact_checksums.remove(&type_key);
            }
            refreshed_types += 1;
            response.add_message(format!("refreshed {coordinate} [{type_key}]"));
        }

        // A pass where every artifact type failed leaves the store untouched:
        // the version was never successfully cached, so it must keep showing
        // as missing and stay eligible for an immediate retry.
        if refreshed_types == 0 && response.has_errors() {
            warn!(
                coordinate = %coordinate,
                errors = response.errors.len(),
                causing_event,
                "Refresh failed for every artifact type, store record unchanged"
            );
            return;
        }

        data.mark_refreshed(causing_event);
        if let Err(e) = self.upsert_version_data_with_retry(data).await {
            response.add_error(format!("cannot update store record for {coordinate}: {e}"));
        } else {
            let project = StoreProject::new(
                format!("{}:{}", coordinate.group_id, coordinate.artifact_id),
                coordinate.group_id.clone(),
                coordinate.artifact_id.clone(),
            );
            if let Err(e) = self.store.ensure_project(project).await {
                response.add_error(format!("cannot register project for {coordinate}: {e}"));
            }
        }

        self.metrics.increment_counter(metrics::VERSION_REFRESH, 1);
        self.metrics.record_duration_millis(
            metrics::VERSION_REFRESH_DURATION,
            started.elapsed().as_millis() as u64,
        );
        info!(
            coordinate = %coordinate,
            refreshed_types,
            errors = response.errors.len(),
            causing_event,
            "Version refresh completed"
        );

        if transitive && !response.has_errors() {
            let child_event = events::child_event(causing_event, "refresh-dependencies");
            match self
                .dependencies
                .update_transitive_dependencies_for_event(
                    &coordinate.group_id,
                    &coordinate.artifact_id,
                    &coordinate.version_id,
                    &child_event,
                )
                .await
            {
                Ok(data) => {
                    let report = data.transitive_dependencies_report.unwrap_or_default();
                    response.add_message(format!(
                        "resolved {} transitive dependencies for {coordinate}",
                        report.dependencies.len()
                    ));
                    for error in report.errors {
                        response.add_error(error);
                    }
                }
                Err(e) => {
                    response.add_error(format!(
                        "dependency resolution failed for {coordinate}: {e}"
                    ));
                }
            }
        }
    }

    /// Refresh every version of one project. `all_versions = false` restricts
    /// the pass to the project's floating snapshots. Per-version failures are
    /// collected; the call never aborts on one version.
    #[instrument(skip(self))]
    pub async fn refresh_all_versions_for_project(
        &self,
        group_id: &str,
        artifact_id: &str,
        full_update: bool,
        all_versions: bool,
        transitive: bool,
        causing_event: &str,
    ) -> MetadataNotificationResponse {
        let project = ProjectCoordinate::new(group_id, artifact_id);
        let mut response = MetadataNotificationResponse::new();

        let published = match self.repository.list_versions(&project).await {
            Ok(published) => published,
            Err(e) => {
                response.add_error(format!("cannot list versions for {project}: {e}"));
                return response;
            }
        };

        let selected: Vec<&String> = published
            .iter()
            .filter(|version| all_versions || VersionId::is_snapshot(version))
            .collect();
        debug!(
            project = %project,
            selected = selected.len(),
            published = published.len(),
            "Refreshing project versions"
        );

        for version in selected {
            let version_response = self
                .refresh_version_for_project(
                    group_id,
                    artifact_id,
                    version,
                    full_update,
                    transitive,
                    causing_event,
                )
                .await;
            response.combine(version_response);
        }
        response
    }

    /// Refresh every known project. Per-project failures are isolated and
    /// reported, never propagated.
    #[instrument(skip(self))]
    pub async fn refresh_all_versions_for_all_projects(
        &self,
        full_update: bool,
        all_versions: bool,
        transitive: bool,
        causing_event: &str,
    ) -> MetadataNotificationResponse {
        let mut response = MetadataNotificationResponse::new();
        let projects = match self.store.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                response.add_error(format!("cannot list depot projects: {e}"));
                return response;
            }
        };

        info!(
            project_count = projects.len(),
            full_update, all_versions, causing_event, "Fleet-wide refresh started"
        );
        for project in projects {
            let project_response = self
                .refresh_all_versions_for_project(
                    &project.coordinate.group_id,
                    &project.coordinate.artifact_id,
                    full_update,
                    all_versions,
                    transitive,
                    causing_event,
                )
                .await;
            response.combine(project_response);
        }
        response
    }

    /// Cheap frequent-cadence sweep touching only each project's default
    /// snapshot.
    #[instrument(skip(self))]
    pub async fn refresh_default_snapshots_for_all_projects(
        &self,
        full_update: bool,
        transitive: bool,
        causing_event: &str,
    ) -> MetadataNotificationResponse {
        let mut response = MetadataNotificationResponse::new();
        let projects = match self.store.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                response.add_error(format!("cannot list depot projects: {e}"));
                return response;
            }
        };

        for project in projects {
            let coordinate = project.coordinate.version(MASTER_SNAPSHOT);
            match self.repository.version_exists(&coordinate).await {
                Ok(true) => {
                    let version_response = self
                        .refresh_version_for_project(
                            &project.coordinate.group_id,
                            &project.coordinate.artifact_id,
                            MASTER_SNAPSHOT,
                            full_update,
                            transitive,
                            causing_event,
                        )
                        .await;
                    response.combine(version_response);
                }
                Ok(false) => {
                    response.add_message(format!(
                        "project {} has no default snapshot, skipped",
                        project.coordinate
                    ));
                }
                Err(e) => {
                    response.add_error(format!(
                        "cannot reach repository for {coordinate}: {e}"
                    ));
                }
            }
        }
        response
    }

    async fn put_entities_with_retry(
        &self,
        coordinate: &Coordinate,
        entities: Vec<StoredEntity>,
    ) -> crate::error::Result<()> {
        for attempt in 1..STORE_WRITE_RETRIES {
            match self.store.put_entities(coordinate, entities.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        coordinate = %coordinate,
                        attempt,
                        "Store write failed, retrying: {}", e
                    );
                }
            }
        }
        self.store.put_entities(coordinate, entities).await
    }

    async fn upsert_version_data_with_retry(
        &self,
        data: StoreProjectVersionData,
    ) -> crate::error::Result<()> {
        for attempt in 1..STORE_WRITE_RETRIES {
            match self.store.upsert_version_data(data.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        coordinate = %data.coordinate,
                        attempt,
                        "Version record write failed, retrying: {}", e
                    );
                }
            }
        }
        self.store.upsert_version_data(data).await
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepotConfig;
    use crate::metrics::NoopMetrics;
    use crate::store::InMemoryMetadataStore;
    use crate::test_helpers::{FakeRepositoryClient, StubEntitiesHandler};

    fn build_service(
        repository: FakeRepositoryClient,
    ) -> (ArtifactsRefreshService, Arc<InMemoryMetadataStore>) {
        let store = Arc::new(InMemoryMetadataStore::new());
        let repository = Arc::new(repository);
        let registry = Arc::new(ArtifactHandlerRegistry::new(vec![Arc::new(
            StubEntitiesHandler,
        )]));
        let dependencies = Arc::new(RefreshDependenciesService::new(
            store.clone(),
            repository.clone(),
        ));
        let service = ArtifactsRefreshService::new(
            store.clone(),
            repository,
            registry,
            dependencies,
            Arc::new(NoopMetrics),
            DepotConfig::default().refresh,
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_coordinate_lock_entry_dropped_after_refresh() {
        let (service, _store) = build_service(
            FakeRepositoryClient::new().with_versions("com.example", "test-artifact", &["1.0.0"]),
        );

        let response = service
            .refresh_version_for_project(
                "com.example",
                "test-artifact",
                "1.0.0",
                true,
                false,
                "test-event",
            )
            .await;
        assert!(!response.has_errors());
        assert_eq!(service.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_lock_table_empty_after_failed_refresh() {
        let (service, _store) =
            build_service(FakeRepositoryClient::new().with_versions(
                "com.example",
                "test-artifact",
                &["1.0.0"],
            ));

        let response = service
            .refresh_version_for_project(
                "com.example",
                "test-artifact",
                "9.9.9",
                true,
                false,
                "test-event",
            )
            .await;
        assert!(response.has_errors());
        assert_eq!(service.in_flight_len(), 0);
    }
}
