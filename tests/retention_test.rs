//! Retention engine integration tests: TTL/LRU eviction, oldest-version
//! trimming, deprecation, deletion and the always-true sweep contract.

mod common;

use common::{backdate, build_depot, build_depot_with_config, seed_project};
use depot_core::config::DepotConfig;
use depot_core::models::Coordinate;
use depot_core::resources::AllowAllAuthorizer;
use depot_core::store::MetadataStore;
use depot_core::test_helpers::FakeRepositoryClient;
use std::sync::Arc;

const GROUP: &str = "com.example";
const ARTIFACT: &str = "test-artifact";

fn coordinate(version: &str) -> Coordinate {
    Coordinate::new(GROUP, ARTIFACT, version)
}

#[tokio::test]
async fn test_evict_oldest_with_zero_evicts_every_fixed_release() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(
        &depot.store,
        GROUP,
        ARTIFACT,
        &["1.0.0", "2.0.0", "10.0.0", "master-SNAPSHOT"],
    )
    .await;

    let response = depot
        .core
        .purge
        .evict_oldest_project_versions(GROUP, ARTIFACT, 0)
        .await;
    assert!(!response.has_errors());
    assert_eq!(response.messages.len(), 3);

    for version in ["1.0.0", "2.0.0", "10.0.0"] {
        let record = depot
            .store
            .get_version_data(&coordinate(version))
            .await
            .unwrap()
            .unwrap();
        assert!(record.evicted, "{version} should be evicted");
    }
    // Snapshots are never touched by release trimming.
    let snapshot = depot
        .store
        .get_version_data(&coordinate("master-SNAPSHOT"))
        .await
        .unwrap()
        .unwrap();
    assert!(!snapshot.evicted);
}

#[tokio::test]
async fn test_evict_oldest_keeps_the_numerically_newest_releases() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "2.0.0", "10.0.0"]).await;

    let response = depot
        .core
        .purge
        .evict_oldest_project_versions(GROUP, ARTIFACT, 2)
        .await;
    assert!(!response.has_errors());

    // 10.0.0 > 2.0.0 > 1.0.0 numerically, so only 1.0.0 goes.
    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
    assert!(!depot
        .store
        .get_version_data(&coordinate("10.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
}

#[tokio::test]
async fn test_evict_oldest_with_enough_budget_evicts_nothing() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "2.0.0"]).await;

    let response = depot
        .core
        .purge
        .evict_oldest_project_versions(GROUP, ARTIFACT, 5)
        .await;
    assert!(!response.has_errors());
    assert!(response.messages[0].contains("nothing to evict"));
    for version in ["1.0.0", "2.0.0"] {
        assert!(!depot
            .store
            .get_version_data(&coordinate(version))
            .await
            .unwrap()
            .unwrap()
            .evicted);
    }
}

#[tokio::test]
async fn test_lru_sweep_uses_separate_ttls_and_returns_true() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(
        &depot.store,
        GROUP,
        ARTIFACT,
        &["1.0.0", "2.0.0", "old-SNAPSHOT", "master-SNAPSHOT"],
    )
    .await;
    backdate(&depot.store, &coordinate("1.0.0"), 400, None).await;
    backdate(&depot.store, &coordinate("2.0.0"), 400, Some(10)).await;
    backdate(&depot.store, &coordinate("old-SNAPSHOT"), 40, None).await;
    backdate(&depot.store, &coordinate("master-SNAPSHOT"), 10, None).await;

    let completed = depot
        .core
        .purge
        .evict_least_recently_used(365, 30)
        .await
        .unwrap();
    assert!(completed);

    // Release idle 400 days: gone. Release refreshed long ago but accessed
    // recently: kept.
    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
    assert!(!depot
        .store
        .get_version_data(&coordinate("2.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
    // Snapshot TTL is the shorter one.
    assert!(depot
        .store
        .get_version_data(&coordinate("old-SNAPSHOT"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
    assert!(!depot
        .store
        .get_version_data(&coordinate("master-SNAPSHOT"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
}

#[tokio::test]
async fn test_sweeps_return_true_on_empty_store() {
    let depot = build_depot(FakeRepositoryClient::new());
    assert!(depot
        .core
        .purge
        .evict_least_recently_used(365, 30)
        .await
        .unwrap());
    assert!(depot
        .core
        .purge
        .deprecate_versions_not_in_repository()
        .await
        .unwrap());
}

#[tokio::test]
async fn test_lru_sweep_trims_snapshots_beyond_allowed_maximum() {
    let mut config = DepotConfig::default();
    config.retention.maximum_snapshots_allowed = 2;
    let depot = build_depot_with_config(FakeRepositoryClient::new(), config);

    let snapshots = ["a-SNAPSHOT", "b-SNAPSHOT", "c-SNAPSHOT", "d-SNAPSHOT"];
    seed_project(&depot.store, GROUP, ARTIFACT, &snapshots).await;
    // Distinct refresh ages, all inside the TTL; a=oldest, d=newest.
    for (days, version) in [(20, "a-SNAPSHOT"), (15, "b-SNAPSHOT"), (10, "c-SNAPSHOT"), (5, "d-SNAPSHOT")] {
        backdate(&depot.store, &coordinate(version), days, None).await;
    }

    depot
        .core
        .purge
        .evict_least_recently_used(365, 30)
        .await
        .unwrap();

    for (version, expect_evicted) in [
        ("a-SNAPSHOT", true),
        ("b-SNAPSHOT", true),
        ("c-SNAPSHOT", false),
        ("d-SNAPSHOT", false),
    ] {
        let record = depot
            .store
            .get_version_data(&coordinate(version))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.evicted, expect_evicted, "{version}");
    }
}

#[tokio::test]
async fn test_deprecation_marks_only_versions_gone_upstream() {
    let depot =
        build_depot(FakeRepositoryClient::new().with_versions(GROUP, ARTIFACT, &["1.0.0"]));
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "0.9.0"]).await;

    assert!(depot
        .core
        .purge
        .deprecate_versions_not_in_repository()
        .await
        .unwrap());

    assert!(depot
        .store
        .get_version_data(&coordinate("0.9.0"))
        .await
        .unwrap()
        .unwrap()
        .deprecated);
    assert!(!depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .unwrap()
        .deprecated);
}

#[tokio::test]
async fn test_evict_versions_not_used_targets_never_accessed_records() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "2.0.0"]).await;
    backdate(&depot.store, &coordinate("2.0.0"), 1, Some(0)).await;

    let response = depot.core.purge.evict_versions_not_used().await;
    assert!(!response.has_errors());

    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
    assert!(!depot
        .store
        .get_version_data(&coordinate("2.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);
}

#[tokio::test]
async fn test_delete_snapshot_versions_csv_is_split_verbatim() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(
        &depot.store,
        GROUP,
        ARTIFACT,
        &["1.0.0-SNAPSHOT", "2.0.0-SNAPSHOT", "1.0.0"],
    )
    .await;

    let (_, purge_resource, _) = depot.core.resources(Arc::new(AllowAllAuthorizer));
    let summary = purge_resource
        .delete_snapshot_versions(GROUP, ARTIFACT, "1.0.0-SNAPSHOT, 2.0.0-SNAPSHOT")
        .await
        .unwrap();

    // The first identifier matches and is deleted; the second keeps its
    // leading space and misses the stored record.
    assert!(summary.contains("deleted '1.0.0-SNAPSHOT'"));
    assert!(summary.contains("skipped ' 2.0.0-SNAPSHOT'"));
    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0-SNAPSHOT"))
        .await
        .unwrap()
        .is_none());
    assert!(depot
        .store
        .get_version_data(&coordinate("2.0.0-SNAPSHOT"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_delete_snapshot_versions_refuses_fixed_releases() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0"]).await;

    let summary = depot
        .core
        .purge
        .delete_snapshot_versions(GROUP, ARTIFACT, vec!["1.0.0".to_string()])
        .await;
    assert!(summary.contains("refused '1.0.0'"));
    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_single_version_evict_delete_and_deprecate() {
    let depot = build_depot(FakeRepositoryClient::new());
    seed_project(&depot.store, GROUP, ARTIFACT, &["1.0.0", "2.0.0", "3.0.0"]).await;

    let response = depot.core.purge.evict(GROUP, ARTIFACT, "1.0.0").await;
    assert!(!response.has_errors());
    assert!(depot
        .store
        .get_version_data(&coordinate("1.0.0"))
        .await
        .unwrap()
        .unwrap()
        .evicted);

    let response = depot.core.purge.delete(GROUP, ARTIFACT, "2.0.0").await;
    assert!(!response.has_errors());
    assert!(depot
        .store
        .get_version_data(&coordinate("2.0.0"))
        .await
        .unwrap()
        .is_none());

    let response = depot.core.purge.deprecate(GROUP, ARTIFACT, "3.0.0").await;
    assert!(!response.has_errors());
    assert!(depot
        .store
        .get_version_data(&coordinate("3.0.0"))
        .await
        .unwrap()
        .unwrap()
        .deprecated);

    // Operations on unknown coordinates report, they do not throw.
    let response = depot.core.purge.evict(GROUP, ARTIFACT, "9.9.9").await;
    assert!(response.has_errors());
}
