//! Error types for permcalc.
//!
//! Only construction-time problems surface as errors. Evaluation of a
//! permission never fails: anything unresolvable collapses to
//! [`Tristate::Undefined`](crate::Tristate::Undefined).

/// Error types covering construction and configuration.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("Invalid context: key {key:?} / value {value:?} must be non-empty")]
    InvalidContext { key: String, value: String },

    #[error("Permission string must be non-empty")]
    EmptyPermission,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown comparison: {0}")]
    UnknownComparison(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PermissionError {
    fn from(err: serde_json::Error) -> Self {
        PermissionError::Serialization(err.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PermissionError>;
