//! # Cached Artifact Payloads
//!
//! The store holds one or more payloads per coordinate, extracted by the
//! artifact-type handlers. Three payload shapes exist: a typed entity
//! definition with an opaque content map, a reference pointing at content held
//! elsewhere, and a raw serialized string.

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Typed entity payload: a path, a classifier path and an opaque content map.
///
/// `PartialEq` covers the content map; `Hash` deliberately does not. The
/// upstream behavior this cache mirrors hashes only the paths, and depot
/// records written under the old scheme must keep colliding the same way, so
/// differing content hashes equal. Unequal-but-colliding values are legal for
/// the `Hash`/`Eq` contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub path: String,
    pub classifier_path: String,
    pub content: BTreeMap<String, serde_json::Value>,
}

impl EntityDefinition {
    pub fn new(path: impl Into<String>, classifier_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            classifier_path: classifier_path.into(),
            content: BTreeMap::new(),
        }
    }

    pub fn with_content(mut self, content: BTreeMap<String, serde_json::Value>) -> Self {
        self.content = content;
        self
    }
}

impl Hash for EntityDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.classifier_path.hash(state);
    }
}

/// Inline entity payload for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityData {
    pub coordinate: Coordinate,
    pub definition: EntityDefinition,
}

/// Payload held by reference rather than inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub coordinate: Coordinate,
    pub reference: String,
}

/// Opaque serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringData {
    pub coordinate: Coordinate,
    pub data: String,
}

/// A cached artifact payload of any shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StoredEntity {
    Entity(EntityData),
    Reference(EntityReference),
    Raw(StringData),
}

impl StoredEntity {
    pub fn coordinate(&self) -> &Coordinate {
        match self {
            StoredEntity::Entity(e) => &e.coordinate,
            StoredEntity::Reference(r) => &r.coordinate,
            StoredEntity::Raw(s) => &s.coordinate,
        }
    }

    /// Identity scheme not yet assigned; every variant reports an empty id.
    pub fn id(&self) -> &str {
        ""
    }
}
