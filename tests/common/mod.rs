//! Shared fixtures for the integration suite.

use chrono::{Duration, Utc};
use depot_core::config::DepotConfig;
use depot_core::metrics::InMemoryMetrics;
use depot_core::models::{Coordinate, StoreProjectVersionData};
use depot_core::store::{InMemoryMetadataStore, MetadataStore, StoreProject};
use depot_core::test_helpers::{FakeRepositoryClient, StubEntitiesHandler};
use depot_core::DepotCore;
use std::sync::Arc;

pub struct TestDepot {
    pub core: DepotCore,
    pub store: Arc<InMemoryMetadataStore>,
    pub repository: Arc<FakeRepositoryClient>,
    pub metrics: Arc<InMemoryMetrics>,
}

pub fn build_depot(repository: FakeRepositoryClient) -> TestDepot {
    build_depot_with_config(repository, DepotConfig::default())
}

pub fn build_depot_with_config(
    repository: FakeRepositoryClient,
    config: DepotConfig,
) -> TestDepot {
    let store = Arc::new(InMemoryMetadataStore::new());
    let repository = Arc::new(repository);
    let metrics = InMemoryMetrics::new();
    let core = DepotCore::build(
        config,
        store.clone(),
        repository.clone(),
        metrics.clone(),
        vec![Arc::new(StubEntitiesHandler)],
    );
    TestDepot {
        core,
        store,
        repository,
        metrics,
    }
}

/// Register a project and seed cached version records for it.
pub async fn seed_project(
    store: &InMemoryMetadataStore,
    group_id: &str,
    artifact_id: &str,
    versions: &[&str],
) {
    store
        .ensure_project(StoreProject::new(
            format!("{group_id}:{artifact_id}"),
            group_id,
            artifact_id,
        ))
        .await
        .unwrap();
    for version in versions {
        store
            .upsert_version_data(StoreProjectVersionData::new(
                Coordinate::new(group_id, artifact_id, *version),
                "seed",
            ))
            .await
            .unwrap();
    }
}

/// Backdate a record's refresh time, and optionally its access time, by whole
/// days.
pub async fn backdate(
    store: &InMemoryMetadataStore,
    coordinate: &Coordinate,
    refreshed_days_ago: i64,
    accessed_days_ago: Option<i64>,
) {
    let mut record = store
        .get_version_data(coordinate)
        .await
        .unwrap()
        .expect("record must be seeded before backdating");
    record.last_refreshed = Utc::now() - Duration::days(refreshed_days_ago);
    record.last_accessed = accessed_days_ago.map(|days| Utc::now() - Duration::days(days));
    store.upsert_version_data(record).await.unwrap();
}
