//! # Upstream Repository Seam
//!
//! The artifact repository is the source of truth the depot mirrors. The core
//! only needs a coordinate-addressable listing and content-fetch capability,
//! expressed here as a read-only trait; the wire protocol behind it is out of
//! scope. Every call may block on the network and carries the driver's own
//! bounded timeout; a failure is returned as `RepositoryError` and the engines
//! convert it into a per-coordinate error entry rather than aborting batches.

use crate::error::Result;
use crate::handlers::ArtifactType;
use crate::models::{Coordinate, ProjectCoordinate};
use async_trait::async_trait;

/// One file fetched from the repository for a coordinate and artifact type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: String,
    pub content: String,
}

impl ArtifactFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Read-only client for the upstream artifact repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Published version identifiers for a project, snapshots included.
    async fn list_versions(&self, project: &ProjectCoordinate) -> Result<Vec<String>>;

    /// The latest published fixed release, if any.
    async fn latest_version(&self, project: &ProjectCoordinate) -> Result<Option<String>>;

    async fn version_exists(&self, coordinate: &Coordinate) -> Result<bool>;

    /// Content checksum for the cheap change check used by non-full refreshes.
    /// `None` when the repository does not publish one for this coordinate.
    async fn artifact_checksum(
        &self,
        coordinate: &Coordinate,
        artifact_type: ArtifactType,
    ) -> Result<Option<String>>;

    /// Fetch the artifact files for one coordinate and type. Expensive; the
    /// refresh engine guarantees it never runs twice concurrently for the
    /// same coordinate.
    async fn fetch_artifacts(
        &self,
        coordinate: &Coordinate,
        artifact_type: ArtifactType,
    ) -> Result<Vec<ArtifactFile>>;

    /// Declared direct dependencies of one coordinate.
    async fn direct_dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Coordinate>>;
}
