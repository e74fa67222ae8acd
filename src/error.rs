//! Error types for the mailing scheduler
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can abort a scheduling cycle
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A message references a template code that was not supplied
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// A prioritized strategy was requested for a uniform template
    #[error("Template {0} has uniform distribution and no priority window")]
    NoPriorityWindow(String),

    /// A template was supplied without a code
    #[error("Template code must not be empty")]
    EmptyTemplateCode,

    /// Two templates share the same code
    #[error("Duplicate template: {0}")]
    DuplicateTemplate(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
