//! Engine error types
//!
//! Organizing typed input never fails. Errors only surface at the JSON
//! boundary and when loading configuration.

use thiserror::Error;

/// Errors raised by the engine's fallible entry points
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The results bundle could not be parsed
    #[error("invalid results bundle: {0}")]
    InvalidBundle(String),

    /// Configuration could not be parsed or failed validation
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    /// Output could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
