//! # Service Layer
//!
//! The engines driven by the scheduler and the thin resource layer: refresh,
//! transitive dependency resolution, reconciliation and retention. All of them
//! are stateless given the store's current contents; the per-coordinate
//! refresh lock is the only in-process coordination they carry.

pub mod dependencies;
pub mod reconciliation;
pub mod refresh;
pub mod retention;

pub use dependencies::RefreshDependenciesService;
pub use reconciliation::VersionsReconciliationService;
pub use refresh::ArtifactsRefreshService;
pub use retention::ArtifactsPurgeService;
