//! # Version Reconciliation
//!
//! Detects drift between the repository's authoritative version listing and
//! the store's cached listing, per project, without mutating either side by
//! default. The mismatch report is computed fresh on every pass and never
//! persisted. `sync_latest_project_versions` is the action side, run on its
//! own cadence: it repairs the store's latest-version pointer only.
//!
//! Gauges are derived directly from the pass just computed, not separately
//! tracked state.

use crate::constants::metrics;
use crate::error::Result;
use crate::metrics::MetricsClient;
use crate::models::VersionMismatch;
use crate::repository::RepositoryClient;
use crate::store::MetadataStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct VersionsReconciliationService {
    store: Arc<dyn MetadataStore>,
    repository: Arc<dyn RepositoryClient>,
    metrics: Arc<dyn MetricsClient>,
}

impl VersionsReconciliationService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        repository: Arc<dyn RepositoryClient>,
        metrics: Arc<dyn MetricsClient>,
    ) -> Self {
        Self {
            store,
            repository,
            metrics,
        }
    }

    /// Diff repository versions against store versions for every known
    /// project. A project whose listing cannot be collected gets its failure
    /// recorded in that project's errors; the scan continues.
    #[instrument(skip(self))]
    pub async fn find_versions_mismatches(&self) -> Result<Vec<VersionMismatch>> {
        let projects = self.store.list_projects().await?;

        let mut mismatches = Vec::with_capacity(projects.len());
        let mut repo_version_total = 0i64;
        let mut store_version_total = 0i64;
        let mut repo_exceptions = 0i64;

        for project in &projects {
            let mut mismatch = VersionMismatch {
                project_id: project.project_id.clone(),
                group_id: project.coordinate.group_id.clone(),
                artifact_id: project.coordinate.artifact_id.clone(),
                ..VersionMismatch::default()
            };

            let repo_versions = match self.repository.list_versions(&project.coordinate).await {
                Ok(versions) => Some(versions),
                Err(e) => {
                    warn!(project = %project.coordinate, "Repository listing failed: {}", e);
                    mismatch
                        .errors
                        .push(format!("cannot list repository versions: {e}"));
                    repo_exceptions += 1;
                    None
                }
            };
            let store_versions = match self.store.list_versions(&project.coordinate).await {
                Ok(versions) => Some(versions),
                Err(e) => {
                    mismatch
                        .errors
                        .push(format!("cannot list store versions: {e}"));
                    None
                }
            };

            if let (Some(repo_versions), Some(store_versions)) = (repo_versions, store_versions) {
                repo_version_total += repo_versions.len() as i64;
                store_version_total += store_versions.len() as i64;
                let (not_in_store, not_in_repository) =
                    diff_versions(&repo_versions, &store_versions);
                mismatch.versions_not_in_store = not_in_store;
                mismatch.versions_not_in_repository = not_in_repository;
            }

            if mismatch.has_drift() {
                debug!(
                    project = %project.coordinate,
                    missing_in_store = mismatch.versions_not_in_store.len(),
                    missing_in_repository = mismatch.versions_not_in_repository.len(),
                    "Version drift detected"
                );
            }
            mismatches.push(mismatch);
        }

        self.metrics.set_gauge(metrics::PROJECTS, projects.len() as i64);
        self.metrics.set_gauge(metrics::REPO_VERSIONS, repo_version_total);
        self.metrics.set_gauge(metrics::STORE_VERSIONS, store_version_total);
        self.metrics.set_gauge(
            metrics::MISSING_STORE_VERSIONS,
            mismatches
                .iter()
                .map(|m| m.versions_not_in_store.len() as i64)
                .sum(),
        );
        self.metrics.set_gauge(
            metrics::MISSING_REPO_VERSIONS,
            mismatches
                .iter()
                .map(|m| m.versions_not_in_repository.len() as i64)
                .sum(),
        );
        self.metrics.set_gauge(metrics::REPO_EXCEPTIONS, repo_exceptions);

        Ok(mismatches)
    }

    /// Repair the store's latest-version pointer for every project whose
    /// repository listing reports a different latest release.
    #[instrument(skip(self))]
    pub async fn sync_latest_project_versions(&self) -> Result<()> {
        let projects = self.store.list_projects().await?;
        let mut update_exceptions = 0i64;
        let mut updated = 0usize;

        for project in &projects {
            let result = async {
                let latest = self.repository.latest_version(&project.coordinate).await?;
                if let Some(latest) = latest {
                    let current = self.store.get_latest_version(&project.coordinate).await?;
                    if current.as_deref() != Some(latest.as_str()) {
                        self.store
                            .set_latest_version(&project.coordinate, &latest)
                            .await?;
                        return Ok::<bool, crate::error::DepotError>(true);
                    }
                }
                Ok(false)
            }
            .await;

            match result {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(project = %project.coordinate, "Latest-version sync failed: {}", e);
                    update_exceptions += 1;
                }
            }
        }

        self.metrics
            .set_gauge(metrics::PROJECT_UPDATE_EXCEPTIONS, update_exceptions);
        info!(
            project_count = projects.len(),
            updated, update_exceptions, "Latest-version sync completed"
        );
        Ok(())
    }
}

/// Partition the two listings into (repository − store, store − repository).
fn diff_versions(repo_versions: &[String], store_versions: &[String]) -> (Vec<String>, Vec<String>) {
    let repo: BTreeSet<&String> = repo_versions.iter().collect();
    let store: BTreeSet<&String> = store_versions.iter().collect();
    let not_in_store = repo.difference(&store).map(|v| (*v).clone()).collect();
    let not_in_repository = store.difference(&repo).map(|v| (*v).clone()).collect();
    (not_in_store, not_in_repository)
}
