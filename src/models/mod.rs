//! # Domain Model Layer
//!
//! Data types shared by the refresh, reconciliation and retention engines:
//! coordinates and version identifiers, cached entity payloads, per-coordinate
//! store records, and the report/accumulator types returned to callers.

pub mod coordinate;
pub mod entity;
pub mod notification;
pub mod version_data;

pub use coordinate::{Coordinate, ProjectCoordinate, VersionId};
pub use entity::{EntityData, EntityDefinition, EntityReference, StoredEntity, StringData};
pub use notification::MetadataNotificationResponse;
pub use version_data::{DependencyReport, StoreProjectVersionData, VersionMismatch};
