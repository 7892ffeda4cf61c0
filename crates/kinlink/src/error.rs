//! Errors surfaced by Kinlink binaries.
//!
//! The engine itself never fails on malformed findings; it skips them. What
//! can fail is everything around it: reading a bundle, parsing its JSON,
//! validating an engine config and looking up a person by name.

use kinlink_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundle or output JSON that serde rejected
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config validation or bundle errors from the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Config file that could not be read
    #[error("configuration error: {0}")]
    Config(String),

    /// Input held no bundle at all, usually an empty pipe
    #[error("empty results bundle")]
    EmptyBundle,

    /// No organized person carries the requested name
    #[error("no person named {0:?}")]
    UnknownPerson(String),
}

pub type Result<T> = std::result::Result<T, Error>;
