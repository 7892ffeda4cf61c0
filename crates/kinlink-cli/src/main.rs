//! Kinlink CLI - Main Entry Point
//!
//! Reads a results bundle as JSON and writes organized results to stdout.
//!
//! Usage:
//!     kinlink --input bundle.json --relationships
//!     cat bundle.json | kinlink --pretty
//!     kinlink --input bundle.json --associates-of "Robert Miller" --depth 2

use std::path::PathBuf;

use clap::Parser;
use kinlink::core::{Associate, LinkageEngine};
use kinlink::input::{load_bundle, load_config};
use kinlink::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kinlink")]
#[command(about = "Organize multi-source person findings into linked, scored persons")]
#[command(version)]
struct Args {
    /// Results bundle JSON file (stdin when omitted or "-")
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Engine config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Include the relationship graph in the output
    #[arg(short, long)]
    relationships: bool,

    /// Print persons linked to NAME instead of the full results
    #[arg(long, value_name = "NAME")]
    associates_of: Option<String>,

    /// Hop limit for --associates-of
    #[arg(long, default_value = "1")]
    depth: usize,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level (debug, info, warn, error). RUST_LOG overrides.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct AssociatesReport<'a> {
    person: &'a str,
    depth: usize,
    associates: Vec<Associate>,
}

fn main() {
    let args = Args::parse();
    kinlink::tracing::init_with_filter(&args.log_level);

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bundle = load_bundle(args.input.as_deref())?;
    if bundle.search_params.is_empty() {
        warn!("bundle has no search parameters");
    }

    info!("Starting Kinlink v{}", env!("CARGO_PKG_VERSION"));
    let engine = LinkageEngine::new(config);

    let json = match args.associates_of {
        Some(name) => {
            let results = engine.organize(&bundle);
            let graph = engine.detect_relationships(&results.persons);
            let start = graph
                .find_node(&name)
                .ok_or_else(|| Error::UnknownPerson(name.clone()))?;
            let report = AssociatesReport {
                person: &graph.nodes()[start],
                depth: args.depth,
                associates: graph.associates_at_depth(start, args.depth),
            };
            to_json(&report, args.pretty)?
        }
        None if args.relationships => {
            to_json(&engine.organize_with_relationships(&bundle), args.pretty)?
        }
        None => to_json(&engine.organize(&bundle), args.pretty)?,
    };

    println!("{}", json);
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
