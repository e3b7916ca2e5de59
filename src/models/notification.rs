//! # Operation Outcome Accumulator
//!
//! One logical operation (which may span thousands of coordinates) reports its
//! outcome through a mutable accumulator of messages and errors. Failures are
//! appended, never raised; a caller always gets back the full picture of what
//! succeeded and what failed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNotificationResponse {
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

impl MetadataNotificationResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    pub fn add_error(&mut self, error: impl Into<String>) -> &mut Self {
        self.errors.push(error.into());
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Merge a sub-operation's outcome into this one.
    pub fn combine(&mut self, other: MetadataNotificationResponse) -> &mut Self {
        self.messages.extend(other.messages);
        self.errors.extend(other.errors);
        self
    }
}
