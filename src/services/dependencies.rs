//! # Transitive Dependency Resolution
//!
//! Walks the declared direct dependencies of a coordinate recursively against
//! the repository and attaches the resulting report to the coordinate's store
//! record. The walk is cycle-safe: a visited set stops revisits, and an edge
//! that closes a cycle is recorded in the report's errors instead of looping
//! or failing. A dependency whose own declarations cannot be fetched is
//! likewise recorded, and resolution of the rest of the graph continues.

use crate::constants::events;
use crate::error::Result;
use crate::models::{Coordinate, DependencyReport, StoreProjectVersionData};
use crate::repository::RepositoryClient;
use crate::store::MetadataStore;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct RefreshDependenciesService {
    store: Arc<dyn MetadataStore>,
    repository: Arc<dyn RepositoryClient>,
}

impl RefreshDependenciesService {
    pub fn new(store: Arc<dyn MetadataStore>, repository: Arc<dyn RepositoryClient>) -> Self {
        Self { store, repository }
    }

    /// Resolve the full transitive dependency set for one coordinate and
    /// persist it on the coordinate's version record.
    #[instrument(skip(self))]
    pub async fn update_transitive_dependencies(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
    ) -> Result<StoreProjectVersionData> {
        self.update_transitive_dependencies_for_event(
            group_id,
            artifact_id,
            version_id,
            events::UPDATE_TRANSITIVE_DEPENDENCIES,
        )
        .await
    }

    /// Variant carrying the causing event of the operation that triggered the
    /// resolution, used when a refresh chains into it.
    pub(crate) async fn update_transitive_dependencies_for_event(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_id: &str,
        causing_event: &str,
    ) -> Result<StoreProjectVersionData> {
        let root = Coordinate::new(group_id, artifact_id, version_id);

        let mut report = DependencyReport::default();
        let mut visited = HashSet::from([root.clone()]);
        let mut path = vec![root.clone()];
        self.walk(&root, &mut path, &mut visited, &mut report).await;

        debug!(
            coordinate = %root,
            dependency_count = report.dependencies.len(),
            error_count = report.errors.len(),
            causing_event,
            "Transitive dependency resolution completed"
        );

        let mut data = match self.store.get_version_data(&root).await? {
            Some(data) => data,
            None => StoreProjectVersionData::new(root.clone(), causing_event),
        };
        data.transitive_dependencies_report = Some(report);
        self.store.upsert_version_data(data.clone()).await?;
        Ok(data)
    }

    /// Depth-first walk with path tracking. `path` holds the chain from the
    /// root to `coordinate`, so an edge into it is a cycle.
    fn walk<'a>(
        &'a self,
        coordinate: &'a Coordinate,
        path: &'a mut Vec<Coordinate>,
        visited: &'a mut HashSet<Coordinate>,
        report: &'a mut DependencyReport,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let declared = match self.repository.direct_dependencies(coordinate).await {
                Ok(declared) => declared,
                Err(e) => {
                    report
                        .errors
                        .push(format!("cannot resolve dependencies of {coordinate}: {e}"));
                    return;
                }
            };

            for dependency in declared {
                if path.contains(&dependency) {
                    report.errors.push(format!(
                        "dependency cycle detected: {coordinate} -> {dependency}"
                    ));
                    continue;
                }
                report.dependencies.insert(dependency.clone());
                if visited.insert(dependency.clone()) {
                    path.push(dependency.clone());
                    self.walk(&dependency, path, visited, report).await;
                    path.pop();
                }
            }
        })
    }
}
