//! # Composition Root
//!
//! Explicit constructor wiring for the whole core: one function builds every
//! service with its dependencies passed in, no container, no globals. The
//! assembled handle exposes the services and registers the standing schedules
//! on a scheduler.

use crate::config::DepotConfig;
use crate::constants::{schedules, MINUTE};
use crate::handlers::{ArtifactHandler, ArtifactHandlerRegistry};
use crate::metrics::MetricsClient;
use crate::repository::RepositoryClient;
use crate::resources::{
    ArtifactPurgeResource, ArtifactRefreshResource, AuthorizationProvider, RepositoryResource,
};
use crate::scheduler::{job, Scheduler};
use crate::services::{
    ArtifactsPurgeService, ArtifactsRefreshService, RefreshDependenciesService,
    VersionsReconciliationService,
};
use crate::store::MetadataStore;
use std::sync::Arc;
use tracing::info;

/// The assembled depot core.
pub struct DepotCore {
    pub config: DepotConfig,
    pub refresh: Arc<ArtifactsRefreshService>,
    pub dependencies: Arc<RefreshDependenciesService>,
    pub reconciliation: Arc<VersionsReconciliationService>,
    pub purge: Arc<ArtifactsPurgeService>,
}

impl DepotCore {
    /// Build every service with explicit dependencies. The store, repository
    /// client, metrics client and artifact handlers are the external
    /// collaborators the caller supplies.
    pub fn build(
        config: DepotConfig,
        store: Arc<dyn MetadataStore>,
        repository: Arc<dyn RepositoryClient>,
        metrics: Arc<dyn MetricsClient>,
        handlers: Vec<Arc<dyn ArtifactHandler>>,
    ) -> Self {
        let registry = Arc::new(ArtifactHandlerRegistry::new(handlers));
        let dependencies = Arc::new(RefreshDependenciesService::new(
            store.clone(),
            repository.clone(),
        ));
        let refresh = Arc::new(ArtifactsRefreshService::new(
            store.clone(),
            repository.clone(),
            registry,
            dependencies.clone(),
            metrics.clone(),
            config.refresh.clone(),
        ));
        let reconciliation = Arc::new(VersionsReconciliationService::new(
            store.clone(),
            repository.clone(),
            metrics,
        ));
        let purge = Arc::new(ArtifactsPurgeService::new(
            store,
            repository,
            config.retention.clone(),
        ));

        Self {
            config,
            refresh,
            dependencies,
            reconciliation,
            purge,
        }
    }

    /// The authorized resource surface the HTTP layer mounts.
    pub fn resources(
        &self,
        authorizer: Arc<dyn AuthorizationProvider>,
    ) -> (
        ArtifactRefreshResource,
        ArtifactPurgeResource,
        RepositoryResource,
    ) {
        (
            ArtifactRefreshResource::new(
                self.refresh.clone(),
                self.dependencies.clone(),
                authorizer.clone(),
            ),
            ArtifactPurgeResource::new(self.purge.clone(), authorizer.clone()),
            RepositoryResource::new(self.reconciliation.clone(), authorizer),
        )
    }

    /// Register the standing schedules. The fleet-wide refresh trigger runs
    /// on every node (the refresh itself deduplicates per coordinate); the
    /// destructive sweeps are single-instance across the deployment; the
    /// reconciliation jobs run everywhere since duplication is harmless.
    pub fn register_schedules(&self, scheduler: &Scheduler) {
        info!(node_id = scheduler.node_id(), "Registering depot schedules");

        let refresh = self.refresh.clone();
        scheduler.register_external_trigger_schedule(
            schedules::REFRESH_ALL_VERSION_ARTIFACTS,
            self.config.refresh.versions_update_interval_in_millis,
            job(move || {
                let refresh = refresh.clone();
                async move {
                    let response = refresh
                        .refresh_default_snapshots_for_all_projects(
                            false,
                            true,
                            schedules::REFRESH_ALL_VERSION_ARTIFACTS,
                        )
                        .await;
                    Ok(!response.has_errors())
                }
            }),
        );

        let purge = self.purge.clone();
        let retention = self.config.retention.clone();
        scheduler.register_single_instance(
            schedules::EVICT_LRU_PROJECT_VERSIONS,
            self.config.scheduler.eviction_initial_delay_in_millis,
            self.config.scheduler.eviction_interval_in_millis,
            job(move || {
                let purge = purge.clone();
                let retention = retention.clone();
                async move {
                    purge
                        .evict_least_recently_used(
                            retention.ttl_for_versions_in_days,
                            retention.ttl_for_snapshots_in_days,
                        )
                        .await
                }
            }),
        );

        let purge = self.purge.clone();
        scheduler.register_single_instance(
            schedules::DEPRECATE_VERSIONS_NOT_IN_REPOSITORY,
            self.config.scheduler.deprecation_initial_delay_in_millis,
            self.config.scheduler.deprecation_interval_in_millis,
            job(move || {
                let purge = purge.clone();
                async move { purge.deprecate_versions_not_in_repository().await }
            }),
        );

        let reconciliation = self.reconciliation.clone();
        scheduler.register(
            schedules::REPOSITORY_METRICS,
            MINUTE,
            self.config.scheduler.reconciliation_interval_in_millis,
            job(move || {
                let reconciliation = reconciliation.clone();
                async move {
                    reconciliation.find_versions_mismatches().await?;
                    Ok(true)
                }
            }),
        );

        let reconciliation = self.reconciliation.clone();
        scheduler.register(
            schedules::SYNC_PROJECT_LATEST_VERSIONS,
            MINUTE,
            self.config.scheduler.reconciliation_interval_in_millis,
            job(move || {
                let reconciliation = reconciliation.clone();
                async move {
                    reconciliation.sync_latest_project_versions().await?;
                    Ok(true)
                }
            }),
        );
    }
}
