//! # Artifact Handler Registry
//!
//! The refresh pipeline is polymorphic over artifact types: each type has a
//! handler that extracts and validates cached payloads from the files fetched
//! for a coordinate. The registry is a dispatch table from type tag to handler
//! value, populated once at composition time and immutable afterwards. A type
//! with no registered handler is a per-coordinate error, never a panic.

use crate::error::{DepotError, Result};
use crate::models::{Coordinate, StoredEntity};
use crate::repository::ArtifactFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Tag identifying one artifact content shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactType {
    Entities,
    FileGenerations,
}

impl ArtifactType {
    pub fn all() -> &'static [ArtifactType] {
        &[ArtifactType::Entities, ArtifactType::FileGenerations]
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::Entities => write!(f, "entities"),
            ArtifactType::FileGenerations => write!(f, "file-generations"),
        }
    }
}

/// Type-specific content extraction, implemented outside the core.
#[async_trait]
pub trait ArtifactHandler: Send + Sync {
    fn artifact_type(&self) -> ArtifactType;

    /// Extract and validate the cached payloads for one coordinate from the
    /// files fetched for it. Malformed content is a `HandlerError`.
    async fn extract(
        &self,
        coordinate: &Coordinate,
        files: &[ArtifactFile],
    ) -> Result<Vec<StoredEntity>>;
}

/// Immutable type-to-handler dispatch table.
pub struct ArtifactHandlerRegistry {
    handlers: HashMap<ArtifactType, Arc<dyn ArtifactHandler>>,
}

impl ArtifactHandlerRegistry {
    pub fn new(handlers: Vec<Arc<dyn ArtifactHandler>>) -> Self {
        let handlers = handlers
            .into_iter()
            .map(|handler| (handler.artifact_type(), handler))
            .collect();
        Self { handlers }
    }

    pub fn get(&self, artifact_type: ArtifactType) -> Result<&Arc<dyn ArtifactHandler>> {
        self.handlers.get(&artifact_type).ok_or_else(|| {
            DepotError::HandlerError(format!(
                "no handler registered for artifact type '{artifact_type}'"
            ))
        })
    }

    /// Artifact types the registry can dispatch, in declaration order.
    pub fn registered_types(&self) -> Vec<ArtifactType> {
        ArtifactType::all()
            .iter()
            .copied()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StringData;

    struct RawPassthroughHandler;

    #[async_trait]
    impl ArtifactHandler for RawPassthroughHandler {
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

    #[tokio::test]
    async fn test_registry_dispatches_by_type() {
        let registry = ArtifactHandlerRegistry::new(vec![Arc::new(RawPassthroughHandler)]);
        assert!(registry.get(ArtifactType::Entities).is_ok());
        assert_eq!(registry.registered_types(), vec![ArtifactType::Entities]);

        let missing = registry.get(ArtifactType::FileGenerations);
        assert!(matches!(missing, Err(DepotError::HandlerError(_))));
    }

    #[tokio::test]
    async fn test_handler_extraction() {
        let registry = ArtifactHandlerRegistry::new(vec![Arc::new(RawPassthroughHandler)]);
        let coordinate = Coordinate::new("com.example", "test-artifact", "1.0.0");
        let files = vec![ArtifactFile::new("entities.json", "{}")];

        let handler = registry.get(ArtifactType::Entities).unwrap();
        let entities = handler.extract(&coordinate, &files).await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].coordinate(), &coordinate);
    }
}
