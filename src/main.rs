//! Binary entry point: wires `pfsc-builder` to a `pfsc-graph` binding and
//! runs one build. Not a CLI front-end (out of scope, spec §1 Non-goals):
//! no subcommands, flags, or argument parser — just the two positional
//! values (`modpath`, `version`) a build identifies itself by, read straight
//! off `std::env::args`.
//!
//! Grounded on `src/main.rs`'s own shape: load `.env` via `dotenvy`, then
//! hand off to the wired-up service.

mod config;

use config::Config;
use pfsc_builder::{BuildMonitor, BuildRequest, Builder};
use pfsc_graph::{GraphReader, GraphWriter, MemoryGraphStore};
use pfsc_graph_neo4j::Neo4jGraphStore;
use pfsc_notes::NotesService;
use pfsc_path::Version;
use pfsc_repo::GixCheckout;
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Fails if .env file not found, not readable, or invalid; a missing
    // .env is tolerated since every var it'd set also has an in-code default.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .event_format(fmt::format().compact())
        .init();

    let config = Config::from_env()?;
    info!(workdir = %config.workdir.display(), cache_dir = %config.cache_dir.display(), "starting pfsc");

    let args: Vec<String> = std::env::args().collect();
    let Some(modpath) = args.get(1) else {
        info!("no modpath given on the command line; wiring checked, exiting");
        return Ok(());
    };
    let version: Version = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(Version::Wip);

    let (writer, reader): (Arc<dyn GraphWriter>, Arc<dyn GraphReader>) = if let Some(neo4j) = &config.neo4j {
        let store = Arc::new(Neo4jGraphStore::new(&neo4j.uri, &neo4j.user, &neo4j.password).await?);
        (store.clone(), store)
    } else {
        let store = Arc::new(MemoryGraphStore::new(config.artifact_root.clone()));
        (store.clone(), store)
    };

    // Wired up so note operations are available alongside a build; nothing
    // in this binary's own startup path calls it yet.
    let _notes = NotesService::new(writer.clone(), reader.clone());

    let checkout = Arc::new(GixCheckout::new(config.workdir.clone()));
    let monitor = Arc::new(BuildMonitor::with_callback(|event| {
        info!(op_code = event.op_code, current = event.current, max = event.max, message = %event.message, "build progress");
    }));
    let builder = Builder::new(checkout, writer, reader, monitor, config.workdir.clone(), config.cache_dir.clone());

    let recursive = version != Version::Wip;
    let req = BuildRequest {
        modpath: modpath.clone(),
        version,
        recursive,
        caching: true,
        dependencies: std::collections::HashMap::new(),
        stored_commit_hash: None,
    };
    let manifest = builder.build(req, tokio_util::sync::CancellationToken::new()).await?;
    println!("{}", serde_json::to_string_pretty(&manifest.to_dict())?);

    Ok(())
}
