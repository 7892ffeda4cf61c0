//! Logging setup shared by Kinlink binaries.
//!
//! The CLI prints organized results as JSON on stdout so they can be piped
//! into `jq` or another hop of a search. Every log line therefore goes to
//! stderr.
//!
//! Levels used by the engine:
//! - `info`: merges refused on geography and merge groups that mix
//!   incompatible regions, the decisions worth auditing after a run
//! - `debug`: every pairwise merge, extraction counts and graph sizes
//!
//! `RUST_LOG=kinlink_core::dedup=debug` narrows output to deduplication.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing at `info`, enough to see every refused merge.
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter, e.g. the CLI's
/// `--log-level`. `RUST_LOG` wins when set.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
