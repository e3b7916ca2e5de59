//! # Thin Resource Layer
//!
//! Pass-through surface the HTTP layer mounts: each operation authorizes the
//! caller against a named permission and forwards to the service below.
//! Authorization is the only failure raised before the core runs; everything
//! past the check reports through the operation's own response type.

use crate::constants::auth_resources;
use crate::error::Result;
use crate::models::{MetadataNotificationResponse, StoreProjectVersionData, VersionMismatch};
use crate::services::{
    ArtifactsPurgeService, ArtifactsRefreshService, RefreshDependenciesService,
    VersionsReconciliationService,
};
use std::sync::Arc;

/// Authorization check consulted before any core operation runs.
pub trait AuthorizationProvider: Send + Sync {
    fn authorize(&self, resource: &str) -> Result<()>;
}

/// Permits everything; for embedded and test deployments.
pub struct AllowAllAuthorizer;

impl AuthorizationProvider for AllowAllAuthorizer {
    fn authorize(&self, _resource: &str) -> Result<()> {
        Ok(())
    }
}

pub struct ArtifactRefreshResource {
    refresh: Arc<ArtifactsRefreshService>,
    dependencies: Arc<RefreshDependenciesService>,
    authorizer: Arc<dyn AuthorizationProvider>,
}

impl ArtifactRefreshResource {
    pub fn new(
        refresh: Arc<ArtifactsRefreshService>,
        dependencies: Arc<RefreshDependenciesService>,
        authorizer: Arc<dyn AuthorizationProvider>,
    ) -> Self {
        Self {
            refresh,
            dependencies,
            authorizer,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn refresh_version_for_project(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
        full_update: bool,
        transitive: bool,
        causing_event: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_REFRESH)?;
        Ok(self
            .refresh
            .refresh_version_for_project(
                group_id,
                artifact_id,
                version_id,
                full_update,
                transitive,
                causing_event,
            )
            .await)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn refresh_all_versions_for_project(
        &self,
        group_id: &str,
        artifact_id: &str,
        full_update: bool,
        all_versions: bool,
        transitive: bool,
        causing_event: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_REFRESH)?;
        Ok(self
            .refresh
            .refresh_all_versions_for_project(
                group_id,
                artifact_id,
                full_update,
                all_versions,
                transitive,
                causing_event,
            )
            .await)
    }

    pub async fn refresh_all_versions_for_all_projects(
        &self,
        full_update: bool,
        all_versions: bool,
        transitive: bool,
        causing_event: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_REFRESH)?;
        Ok(self
            .refresh
            .refresh_all_versions_for_all_projects(
                full_update,
                all_versions,
                transitive,
                causing_event,
            )
            .await)
    }

    pub async fn refresh_default_snapshots_for_all_projects(
        &self,
        full_update: bool,
        transitive: bool,
        causing_event: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_REFRESH)?;
        Ok(self
            .refresh
            .refresh_default_snapshots_for_all_projects(full_update, transitive, causing_event)
            .await)
    }

    pub async fn update_transitive_dependencies(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Result<StoreProjectVersionData> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_REFRESH)?;
        self.dependencies
            .update_transitive_dependencies(group_id, artifact_id, version_id)
            .await
    }
}

pub struct ArtifactPurgeResource {
    purge: Arc<ArtifactsPurgeService>,
    authorizer: Arc<dyn AuthorizationProvider>,
}

impl ArtifactPurgeResource {
    pub fn new(
        purge: Arc<ArtifactsPurgeService>,
        authorizer: Arc<dyn AuthorizationProvider>,
    ) -> Self {
        Self { purge, authorizer }
    }

    pub async fn evict(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        Ok(self.purge.evict(group_id, artifact_id, version_id).await)
    }

    pub async fn delete(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        Ok(self.purge.delete(group_id, artifact_id, version_id).await)
    }

    /// The version list arrives as CSV and is split verbatim: whitespace
    /// after a comma stays on the identifier, matching the observed upstream
    /// behavior. Callers are expected to send well-formed, no-space CSV.
    pub async fn delete_snapshot_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_ids_csv: &str,
    ) -> Result<String> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        let version_ids = split_version_ids(version_ids_csv);
        Ok(self
            .purge
            .delete_snapshot_versions(group_id, artifact_id, version_ids)
            .await)
    }

    pub async fn evict_oldest_project_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        versions_to_keep: usize,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        Ok(self
            .purge
            .evict_oldest_project_versions(group_id, artifact_id, versions_to_keep)
            .await)
    }

    pub async fn deprecate(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        Ok(self.purge.deprecate(group_id, artifact_id, version_id).await)
    }

    pub async fn evict_versions_not_used(&self) -> Result<MetadataNotificationResponse> {
        self.authorizer.authorize(auth_resources::ARTIFACTS_PURGE)?;
        Ok(self.purge.evict_versions_not_used().await)
    }
}

pub struct RepositoryResource {
    reconciliation: Arc<VersionsReconciliationService>,
    authorizer: Arc<dyn AuthorizationProvider>,
}

impl RepositoryResource {
    pub fn new(
        reconciliation: Arc<VersionsReconciliationService>,
        authorizer: Arc<dyn AuthorizationProvider>,
    ) -> Self {
        Self {
            reconciliation,
            authorizer,
        }
    }

    pub async fn find_versions_mismatches(&self) -> Result<Vec<VersionMismatch>> {
        self.authorizer.authorize(auth_resources::REPOSITORY)?;
        self.reconciliation.find_versions_mismatches().await
    }
}

/// Verbatim CSV split, no trimming.
fn split_version_ids(csv: &str) -> Vec<String> {
    csv.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepotError;

    struct DenyAllAuthorizer;

    impl AuthorizationProvider for DenyAllAuthorizer {
        fn authorize(&self, resource: &str) -> Result<()> {
            Err(DepotError::AuthorizationError {
                resource: resource.to_string(),
                message: "denied".to_string(),
            })
        }
    }

    #[test]
    fn test_csv_split_preserves_whitespace() {
        assert_eq!(
            split_version_ids("1.0.0-SNAPSHOT, 2.0.0-SNAPSHOT"),
            vec!["1.0.0-SNAPSHOT", " 2.0.0-SNAPSHOT"]
        );
        assert_eq!(split_version_ids("master-SNAPSHOT"), vec!["master-SNAPSHOT"]);
        assert_eq!(split_version_ids(""), vec![""]);
    }

    #[test]
    fn test_denied_authorizer_reports_resource() {
        let result = DenyAllAuthorizer.authorize(auth_resources::ARTIFACTS_PURGE);
        match result {
            Err(DepotError::AuthorizationError { resource, .. }) => {
                assert_eq!(resource, "ArtifactsPurge");
            }
            other => panic!("expected authorization error, got {other:?}"),
        }
    }
}
