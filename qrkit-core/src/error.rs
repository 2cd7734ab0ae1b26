//! Error types for core operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// Encoding and form adaptation are total and never fail; these errors come
/// from parsing kind names and from the theme service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A payload or form kind name has no mapping.
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// An option value is outside its allowed set.
    #[error("Invalid {field}: {value}")]
    InvalidValue {
        /// Which option was being parsed.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The theme service was used before `init` or after `teardown`.
    #[error("Theme service is not active")]
    ThemeInactive,

    /// Theme persistence I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload or theme (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
