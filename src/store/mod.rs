//! # Metadata Store Seam
//!
//! The persistent store is an external collaborator; the depot core talks to
//! it through the [`MetadataStore`] trait and never owns its I/O driver. The
//! store is the only shared mutable resource in the system — every engine
//! reads and writes it, none owns it exclusively.
//!
//! An in-memory implementation ships in [`memory`] for tests and embedded use.

pub mod memory;

use crate::error::Result;
use crate::models::{Coordinate, ProjectCoordinate, StoreProjectVersionData, StoredEntity};
use async_trait::async_trait;

pub use memory::InMemoryMetadataStore;

/// A project known to the depot, with the upstream project identifier it was
/// registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreProject {
    pub project_id: String,
    pub coordinate: ProjectCoordinate,
}

impl StoreProject {
    pub fn new(
        project_id: impl Into<String>,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            coordinate: ProjectCoordinate::new(group_id, artifact_id),
        }
    }
}

/// Mutable metadata store keyed by coordinate.
///
/// Every method may block on I/O and returns `StoreError` on driver failure;
/// the engines decide whether that aborts the operation or becomes a
/// per-coordinate error entry.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All projects the depot knows about.
    async fn list_projects(&self) -> Result<Vec<StoreProject>>;

    /// Register a project if the depot has not seen it yet.
    async fn ensure_project(&self, project: StoreProject) -> Result<()>;

    /// Version identifiers cached for a project, excluding evicted records.
    async fn list_versions(&self, project: &ProjectCoordinate) -> Result<Vec<String>>;

    /// All per-coordinate records for a project, including evicted ones.
    async fn list_version_data(
        &self,
        project: &ProjectCoordinate,
    ) -> Result<Vec<StoreProjectVersionData>>;

    async fn get_version_data(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<StoreProjectVersionData>>;

    async fn upsert_version_data(&self, data: StoreProjectVersionData) -> Result<()>;

    /// Physically remove one coordinate's record and payloads.
    async fn delete_version_data(&self, coordinate: &Coordinate) -> Result<()>;

    /// The store's record of the project's latest published release.
    async fn get_latest_version(&self, project: &ProjectCoordinate) -> Result<Option<String>>;

    async fn set_latest_version(&self, project: &ProjectCoordinate, version_id: &str)
        -> Result<()>;

    /// Replace the cached payloads for one coordinate.
    async fn put_entities(
        &self,
        coordinate: &Coordinate,
        entities: Vec<StoredEntity>,
    ) -> Result<()>;

    async fn get_entities(&self, coordinate: &Coordinate) -> Result<Vec<StoredEntity>>;

    /// Drop the cached payloads but keep the version record (eviction).
    async fn delete_entities(&self, coordinate: &Coordinate) -> Result<()>;
}
