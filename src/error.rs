//! # Structured Error Handling
//!
//! Central error type for the depot core. Batch operations never surface
//! per-item failures through this type; those accumulate into
//! [`MetadataNotificationResponse`](crate::models::MetadataNotificationResponse)
//! or [`VersionMismatch`](crate::models::VersionMismatch) error lists instead.
//! `DepotError` is reserved for failures of the operation itself: a store that
//! cannot be reached at all, invalid configuration, or an authorization check
//! that fails before the core is invoked.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepotError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Artifact handler error: {0}")]
    HandlerError(String),

    #[error("Scheduling error: {0}")]
    SchedulingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Not authorized for resource '{resource}': {message}")]
    AuthorizationError { resource: String, message: String },
}

impl DepotError {
    /// True when the failure class is worth retrying against the same backend.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DepotError::StoreError(_) | DepotError::RepositoryError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DepotError>;
