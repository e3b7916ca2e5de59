//! # Test Helpers
//!
//! Deterministic fakes used by unit and integration tests: a configurable
//! in-memory repository client with failure injection and fetch counting, and
//! a stub entities handler that passes fetched files through as raw payloads.

use crate::error::{DepotError, Result};
use crate::handlers::{ArtifactHandler, ArtifactType};
use crate::models::{Coordinate, ProjectCoordinate, StoredEntity, StringData, VersionId};
use crate::repository::{ArtifactFile, RepositoryClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Configurable fake of the upstream repository.
#[derive(Default)]
pub struct FakeRepositoryClient {
    versions: Mutex<HashMap<ProjectCoordinate, Vec<String>>>,
    dependencies: Mutex<HashMap<Coordinate, Vec<Coordinate>>>,
    checksums: Mutex<HashMap<(Coordinate, ArtifactType), String>>,
    failing_projects: Mutex<HashSet<ProjectCoordinate>>,
    failing_dependency_lookups: Mutex<HashSet<Coordinate>>,
    fetch_count: AtomicUsize,
    fetch_delay: Mutex<Option<Duration>>,
}

impl FakeRepositoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(
        self,
        group_id: &str,
        artifact_id: &str,
        versions: &[&str],
    ) -> Self {
        self.versions.lock().insert(
            ProjectCoordinate::new(group_id, artifact_id),
            versions.iter().map(|v| (*v).to_string()).collect(),
        );
        self
    }

    pub fn with_dependency(self, from: Coordinate, to: Coordinate) -> Self {
        self.dependencies.lock().entry(from).or_default().push(to);
        self
    }

    pub fn with_checksum(
        self,
        coordinate: Coordinate,
        artifact_type: ArtifactType,
        checksum: &str,
    ) -> Self {
        self.checksums
            .lock()
            .insert((coordinate, artifact_type), checksum.to_string());
        self
    }

    /// Every listing/fetch against this project fails with a repository
    /// error.
    pub fn failing_project(self, group_id: &str, artifact_id: &str) -> Self {
        self.failing_projects
            .lock()
            .insert(ProjectCoordinate::new(group_id, artifact_id));
        self
    }

    /// Direct-dependency lookups for this coordinate fail.
    pub fn failing_dependencies(self, coordinate: Coordinate) -> Self {
        self.failing_dependency_lookups.lock().insert(coordinate);
        self
    }

    /// Delay every artifact fetch, to widen concurrency windows in tests.
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        *self.fetch_delay.lock() = Some(delay);
        self
    }

    /// Number of expensive artifact fetches performed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn publish_version(&self, group_id: &str, artifact_id: &str, version_id: &str) {
        self.versions
            .lock()
            .entry(ProjectCoordinate::new(group_id, artifact_id))
            .or_default()
            .push(version_id.to_string());
    }

    pub fn unpublish_version(&self, group_id: &str, artifact_id: &str, version_id: &str) {
        if let Some(versions) = self
            .versions
            .lock()
            .get_mut(&ProjectCoordinate::new(group_id, artifact_id))
        {
            versions.retain(|v| v != version_id);
        }
    }

    fn check_project(&self, project: &ProjectCoordinate) -> Result<()> {
        if self.failing_projects.lock().contains(project) {
            return Err(DepotError::RepositoryError(format!(
                "repository unreachable for {project}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryClient for FakeRepositoryClient {
    async fn list_versions(&self, project: &ProjectCoordinate) -> Result<Vec<String>> {
        self.check_project(project)?;
        Ok(self.versions.lock().get(project).cloned().unwrap_or_default())
    }

    async fn latest_version(&self, project: &ProjectCoordinate) -> Result<Option<String>> {
        self.check_project(project)?;
        let versions = self.versions.lock().get(project).cloned().unwrap_or_default();
        Ok(versions
            .into_iter()
            .filter(|v| !VersionId::is_snapshot(v))
            .max_by(|a, b| VersionId::compare_releases(a, b)))
    }

    async fn version_exists(&self, coordinate: &Coordinate) -> Result<bool> {
        let project = coordinate.project();
        self.check_project(&project)?;
        Ok(self
            .versions
            .lock()
            .get(&project)
            .is_some_and(|versions| versions.iter().any(|v| v == &coordinate.version_id)))
    }

    async fn artifact_checksum(
        &self,
        coordinate: &Coordinate,
        artifact_type: ArtifactType,
    ) -> Result<Option<String>> {
        self.check_project(&coordinate.project())?;
        Ok(self
            .checksums
            .lock()
            .get(&(coordinate.clone(), artifact_type))
            .cloned())
    }

    async fn fetch_artifacts(
        &self,
        coordinate: &Coordinate,
        artifact_type: ArtifactType,
    ) -> Result<Vec<ArtifactFile>> {
        self.check_project(&coordinate.project())?;
        if !self.version_exists(coordinate).await? {
            return Err(DepotError::RepositoryError(format!(
                "no artifact published for {coordinate}"
            )));
        }
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![ArtifactFile::new(
            format!("{artifact_type}.json"),
            format!("{{\"coordinate\":\"{coordinate}\"}}"),
        )])
    }

    async fn direct_dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Coordinate>> {
        if self.failing_dependency_lookups.lock().contains(coordinate) {
            return Err(DepotError::RepositoryError(format!(
                "cannot read dependency declarations of {coordinate}"
            )));
        }
        Ok(self
            .dependencies
            .lock()
            .get(coordinate)
            .cloned()
            .unwrap_or_default())
    }
}

/// Handler whose extraction always fails, for exercising total-failure
/// refresh paths.
pub struct FailingEntitiesHandler;

#[async_trait]
impl ArtifactHandler for FailingEntitiesHandler {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Entities
    }

    async fn extract(
        &self,
        coordinate: &Coordinate,
        _files: &[ArtifactFile],
    ) -> Result<Vec<StoredEntity>> {
        Err(DepotError::HandlerError(format!(
            "cannot parse entities for {coordinate}"
        )))
    }
}

/// Passes fetched files through as raw string payloads.
pub struct StubEntitiesHandler;

#[async_trait]
impl ArtifactHandler for StubEntitiesHandler {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Entities
    }

    async fn extract(
        &self,
        coordinate: &Coordinate,
        files: &[ArtifactFile],
    ) -> Result<Vec<StoredEntity>> {
        Ok(files
            .iter()
            .map(|file| {
                StoredEntity::Raw(StringData {
                    coordinate: coordinate.clone(),
                    data: file.content.clone(),
                })
            })
            .collect())
    }
}
