//! The graph storage contract (spec §4.8, §4.9) and an in-process binding
//! over it. A Neo4j-backed binding implementing the same traits lives in
//! the sibling `pfsc-graph-neo4j` crate; this one is what the builder uses
//! when no external graph database is configured.

mod memory;
mod traits;

pub use memory::MemoryGraphStore;
pub use traits::{GraphReader, GraphWriter};
