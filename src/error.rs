//! Error types for the CredKeeper core library.

use thiserror::Error;

/// Errors that can occur at the JSON/FFI boundary of the engine.
///
/// Decision outcomes are never errors: a rejected save is reported through
/// the coordinator's `ProvisionalSaveFailure` telemetry value and the engine
/// stays usable for the next form. This enum only covers malformed input
/// handed across a serialization boundary.
///
/// The enum is exposed to Swift/Kotlin via UniFFI as a flat error type,
/// meaning the error variants are exposed as simple enum cases with string
/// messages.
#[derive(Error, Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
#[cfg_attr(feature = "uniffi", uniffi(flat_error))]
pub enum EngineError {
    /// Error serializing/deserializing JSON
    #[error("JSON error: {0}")]
    JsonError(String),

    /// General error
    #[error("Error: {0}")]
    General(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::JsonError(err.to_string())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
