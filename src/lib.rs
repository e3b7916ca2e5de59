#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Depot Core
//!
//! Core engines of the metadata depot: a queryable cache of build-artifact
//! metadata kept consistent with an upstream artifact repository, addressed by
//! (groupId, artifactId, versionId) coordinates.
//!
//! ## Overview
//!
//! The depot mirrors the repository, it does not own the data. Three engines
//! keep the mirror honest:
//!
//! - [`services::ArtifactsRefreshService`] pulls current metadata for one or
//!   more coordinates, runs the type-specific artifact handler over it and
//!   writes the result into the store, with per-coordinate serialization and
//!   partial-failure reporting.
//! - [`services::VersionsReconciliationService`] diffs repository-known
//!   versions against store-known versions per project and can repair the
//!   latest-version pointer.
//! - [`services::ArtifactsPurgeService`] enforces retention policy: TTL/LRU
//!   eviction, deprecation of versions gone from upstream, and physical
//!   deletion.
//!
//! All three are driven by the [`scheduler`], which runs some jobs on every
//! node and others exactly once across the deployment via lease-based mutual
//! exclusion against the shared store.
//!
//! ## Module Organization
//!
//! - [`models`] - Coordinates, cached payloads, version records, reports
//! - [`store`] - Metadata store seam and in-memory implementation
//! - [`repository`] - Upstream repository client seam
//! - [`handlers`] - Artifact-type handler registry
//! - [`services`] - Refresh, dependency, reconciliation and retention engines
//! - [`scheduler`] - Recurring jobs and schedule leases
//! - [`resources`] - Thin authorized pass-through surface
//! - [`bootstrap`] - Explicit composition of the whole core
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging setup
//! - [`metrics`] - Narrow metrics client seam
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use depot_core::bootstrap::DepotCore;
//! use depot_core::config::DepotConfig;
//! use depot_core::metrics::NoopMetrics;
//! use depot_core::scheduler::{InMemoryLeaseStore, Scheduler};
//! use depot_core::store::InMemoryMetadataStore;
//! use depot_core::test_helpers::{FakeRepositoryClient, StubEntitiesHandler};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let core = DepotCore::build(
//!     DepotConfig::default(),
//!     Arc::new(InMemoryMetadataStore::new()),
//!     Arc::new(FakeRepositoryClient::new()),
//!     Arc::new(NoopMetrics),
//!     vec![Arc::new(StubEntitiesHandler)],
//! );
//!
//! let scheduler = Scheduler::new("node-1".to_string(), Arc::new(InMemoryLeaseStore::new()));
//! core.register_schedules(&scheduler);
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod resources;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod test_helpers;

pub use bootstrap::DepotCore;
pub use config::{
    ArtifactsRefreshPolicyConfig, ArtifactsRetentionPolicyConfig, DepotConfig, SchedulerConfig,
};
pub use error::{DepotError, Result};
pub use models::{
    Coordinate, DependencyReport, MetadataNotificationResponse, ProjectCoordinate,
    StoreProjectVersionData, StoredEntity, VersionMismatch,
};
