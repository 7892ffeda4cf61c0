//! # Kinlink Shared Rust Library
//!
//! Infrastructure shared by Kinlink binaries:
//! - **error**: Error type covering IO, JSON, config and engine failures
//! - **tracing**: Logging setup
//! - **input**: Loading results bundles and engine config from disk
//!
//! The engine itself lives in `kinlink-core` and is re-exported as [`core`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kinlink::input::{load_bundle, load_config};
//! use kinlink::core::LinkageEngine;
//!
//! kinlink::tracing::init();
//! let engine = LinkageEngine::new(load_config(Some("kinlink.json".as_ref()))?);
//! let results = engine.organize(&load_bundle(Some("bundle.json".as_ref()))?);
//! ```

pub mod error;
pub mod input;
pub mod tracing;

pub use kinlink_core as core;

pub use error::{Error, Result};
