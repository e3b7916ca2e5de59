//! # Coordinates
//!
//! A coordinate `(group_id, artifact_id, version_id)` is the natural key for
//! one unit of cached metadata. Versions are either fixed releases
//! (`1.2.3`) or floating snapshots (`-SNAPSHOT` suffix, including named branch
//! snapshots such as `master-SNAPSHOT`).

use crate::constants::{MASTER_SNAPSHOT, SNAPSHOT_SUFFIX};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifies a project (all versions of one artifact).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectCoordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl ProjectCoordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn version(&self, version_id: impl Into<String>) -> Coordinate {
        Coordinate::new(self.group_id.clone(), self.artifact_id.clone(), version_id)
    }
}

impl fmt::Display for ProjectCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Identifies one cached metadata unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version_id: String,
}

impl Coordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version_id: version_id.into(),
        }
    }

    pub fn project(&self) -> ProjectCoordinate {
        ProjectCoordinate::new(self.group_id.clone(), self.artifact_id.clone())
    }

    pub fn is_snapshot(&self) -> bool {
        VersionId::is_snapshot(&self.version_id)
    }

    /// String key used for per-coordinate locking and audit logging.
    pub fn key_string(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version_id)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id, self.artifact_id, self.version_id
        )
    }
}

/// Version identifier helpers. Release ordering is numeric per dot-separated
/// component; snapshots sort after any release they share a prefix with and
/// are excluded from oldest-release eviction entirely.
pub struct VersionId;

impl VersionId {
    pub fn is_snapshot(version_id: &str) -> bool {
        version_id.ends_with(SNAPSHOT_SUFFIX)
    }

    pub fn is_master_snapshot(version_id: &str) -> bool {
        version_id == MASTER_SNAPSHOT
    }

    /// Compare two fixed release identifiers. Components that parse as
    /// integers compare numerically; anything else falls back to a string
    /// comparison for that component.
    pub fn compare_releases(left: &str, right: &str) -> Ordering {
        let mut lhs = left.split('.');
        let mut rhs = right.split('.');
        loop {
            match (lhs.next(), rhs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(l), Some(r)) => {
                    let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                        (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                        _ => l.cmp(r),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}
