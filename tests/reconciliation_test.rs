//! Reconciliation integration tests: drift detection, collection-failure
//! isolation, derived gauges and latest-version sync.

mod common;

use common::{build_depot, seed_project};
use depot_core::constants::metrics;
use depot_core::models::ProjectCoordinate;
use depot_core::store::MetadataStore;
use depot_core::test_helpers::FakeRepositoryClient;

const GROUP: &str = "com.example";
const ARTIFACT: &str = "test-artifact";

#[tokio::test]
async fn test_detects_version_missing_from_store() {
    let depot = build_depot(
        FakeRepositoryClient::new().with_versions(GROUP, ARTIFACT, &["1.0.0", "2.0.0"]),
    );
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0"]).await;

    let mismatches = depot
        .core
        .reconciliation
        .find_versions_mismatches()
        .await
        .unwrap();

    assert_eq!(mismatches.len(), 1);
    let mismatch = &mismatches[0];
    assert_eq!(mismatch.group_id, GROUP);
    assert_eq!(mismatch.artifact_id, ARTIFACT);
    assert_eq!(mismatch.versions_not_in_store, vec!["2.0.0"]);
    assert!(mismatch.versions_not_in_repository.is_empty());
    assert!(mismatch.errors.is_empty());
}

#[tokio::test]
async fn test_empty_store_and_empty_repository_are_symmetric() {
    let depot = build_depot(
        FakeRepositoryClient::new().with_versions(GROUP, ARTIFACT, &["1.0.0", "2.0.0", "3.0.0"]),
    );
    seed_project(&depot.store, GROUP, ARTIFACT, &[]).await;

    let mismatches = depot
        .core
        .reconciliation
        .find_versions_mismatches()
        .await
        .unwrap();
    assert_eq!(mismatches[0].versions_not_in_store.len(), 3);
    assert!(mismatches[0].versions_not_in_repository.is_empty());

    let depot = build_depot(FakeRepositoryClient::new().with_versions(GROUP, ARTIFACT, &[]));
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "2.0.0", "3.0.0"]).await;

    let mismatches = depot
        .core
        .reconciliation
        .find_versions_mismatches()
        .await
        .unwrap();
    assert!(mismatches[0].versions_not_in_store.is_empty());
    assert_eq!(mismatches[0].versions_not_in_repository.len(), 3);
}

#[tokio::test]
async fn test_unreachable_project_records_error_and_scan_continues() {
    let depot = build_depot(
        FakeRepositoryClient::new()
            .with_versions(GROUP, "healthy", &["1.0.0"])
            .failing_project(GROUP, "broken"),
    );
    seed_project(&depot.store, GROUP, "broken", &["1.0.0"]).await;
    seed_project(&depot.store, GROUP, "healthy", &["1.0.0"]).await;

    let mismatches = depot
        .core
        .reconciliation
        .find_versions_mismatches()
        .await
        .unwrap();
    assert_eq!(mismatches.len(), 2);

    let broken = mismatches
        .iter()
        .find(|m| m.artifact_id == "broken")
        .unwrap();
    assert_eq!(broken.errors.len(), 1);
    assert!(broken.versions_not_in_store.is_empty());
    assert!(broken.versions_not_in_repository.is_empty());

    let healthy = mismatches
        .iter()
        .find(|m| m.artifact_id == "healthy")
        .unwrap();
    assert!(healthy.errors.is_empty());
    assert!(!healthy.has_drift());

    assert_eq!(depot.metrics.gauge(metrics::REPO_EXCEPTIONS), Some(1));
}

#[tokio::test]
async fn test_gauges_derived_from_the_pass() {
    let depot = build_depot(
        FakeRepositoryClient::new().with_versions(GROUP, ARTIFACT, &["1.0.0", "2.0.0"]),
    );
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "0.9.0"]).await;

    depot
        .core
        .reconciliation
        .find_versions_mismatches()
        .await
        .unwrap();

    assert_eq!(depot.metrics.gauge(metrics::PROJECTS), Some(1));
    assert_eq!(depot.metrics.gauge(metrics::REPO_VERSIONS), Some(2));
    assert_eq!(depot.metrics.gauge(metrics::STORE_VERSIONS), Some(2));
    assert_eq!(depot.metrics.gauge(metrics::MISSING_STORE_VERSIONS), Some(1));
    assert_eq!(depot.metrics.gauge(metrics::MISSING_REPO_VERSIONS), Some(1));
    assert_eq!(depot.metrics.gauge(metrics::REPO_EXCEPTIONS), Some(0));
}

#[tokio::test]
async fn test_sync_latest_repairs_stale_pointer() {
    let depot = build_depot(
        FakeRepositoryClient::new().with_versions(
            GROUP,
            ARTIFACT,
            &["1.0.0", "2.0.0", "master-SNAPSHOT"],
        ),
    );
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0"]).await;
    let project = ProjectCoordinate::new(GROUP, ARTIFACT);
    depot.store.set_latest_version(&project, "1.0.0").await.unwrap();

    depot
        .core
        .reconciliation
        .sync_latest_project_versions()
        .await
        .unwrap();

    // Latest is the highest fixed release; the snapshot never wins.
    assert_eq!(
        depot.store.get_latest_version(&project).await.unwrap(),
        Some("2.0.0".to_string())
    );
    assert_eq!(depot.metrics.gauge(metrics::PROJECT_UPDATE_EXCEPTIONS), Some(0));
}

#[tokio::test]
async fn test_sync_latest_counts_project_failures() {
    let depot = build_depot(FakeRepositoryClient::new().failing_project(GROUP, ARTIFACT));
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0"]).await;

    depot
        .core
        .reconciliation
        .sync_latest_project_versions()
        .await
        .unwrap();

    assert_eq!(depot.metrics.gauge(metrics::PROJECT_UPDATE_EXCEPTIONS), Some(1));
}
