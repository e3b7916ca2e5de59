//! # In-Memory Metadata Store
//!
//! DashMap-backed [`MetadataStore`] implementation used by tests and embedded
//! deployments. Behavior mirrors what the engines expect from a real driver:
//! `list_versions` hides evicted records, deletion removes record and payloads
//! together, and all operations are safe under concurrent access.

use crate::error::Result;
use crate::models::{Coordinate, ProjectCoordinate, StoreProjectVersionData, StoredEntity};
use crate::store::{MetadataStore, StoreProject};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

#[derive(Default)]
pub struct InMemoryMetadataStore {
    projects: Mutex<Vec<StoreProject>>,
    versions: DashMap<Coordinate, StoreProjectVersionData>,
    latest: DashMap<ProjectCoordinate, String>,
    entities: DashMap<Coordinate, Vec<StoredEntity>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn list_projects(&self) -> Result<Vec<StoreProject>> {
        Ok(self.projects.lock().clone())
    }

    async fn ensure_project(&self, project: StoreProject) -> Result<()> {
        let mut projects = self.projects.lock();
        if !projects.iter().any(|p| p.coordinate == project.coordinate) {
            projects.push(project);
        }
        Ok(())
    }

    async fn list_versions(&self, project: &ProjectCoordinate) -> Result<Vec<String>> {
        let mut versions: Vec<String> = self
            .versions
            .iter()
            .filter(|entry| entry.key().project() == *project && !entry.value().evicted)
            .map(|entry| entry.key().version_id.clone())
            .collect();
        versions.sort();
        Ok(versions)
    }

    async fn list_version_data(
        &self,
        project: &ProjectCoordinate,
    ) -> Result<Vec<StoreProjectVersionData>> {
        let mut data: Vec<StoreProjectVersionData> = self
            .versions
            .iter()
            .filter(|entry| entry.key().project() == *project)
            .map(|entry| entry.value().clone())
            .collect();
        data.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        Ok(data)
    }

    async fn get_version_data(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<StoreProjectVersionData>> {
        Ok(self.versions.get(coordinate).map(|entry| entry.value().clone()))
    }

    async fn upsert_version_data(&self, data: StoreProjectVersionData) -> Result<()> {
        self.versions.insert(data.coordinate.clone(), data);
        Ok(())
    }

    async fn delete_version_data(&self, coordinate: &Coordinate) -> Result<()> {
        self.versions.remove(coordinate);
        self.entities.remove(coordinate);
        Ok(())
    }

    async fn get_latest_version(&self, project: &ProjectCoordinate) -> Result<Option<String>> {
        Ok(self.latest.get(project).map(|entry| entry.value().clone()))
    }

    async fn set_latest_version(
        &self,
        project: &ProjectCoordinate,
        version_id: &str,
    ) -> Result<()> {
        self.latest.insert(project.clone(), version_id.to_string());
        Ok(())
    }

    async fn put_entities(
        &self,
        coordinate: &Coordinate,
        entities: Vec<StoredEntity>,
    ) -> Result<()> {
        self.entities.insert(coordinate.clone(), entities);
        Ok(())
    }

    async fn get_entities(&self, coordinate: &Coordinate) -> Result<Vec<StoredEntity>> {
        Ok(self
            .entities
            .get(coordinate)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn delete_entities(&self, coordinate: &Coordinate) -> Result<()> {
        self.entities.remove(coordinate);
        Ok(())
    }
}
