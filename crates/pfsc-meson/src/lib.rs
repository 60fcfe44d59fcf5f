//! Meson prose-DSL and arc-listing parsers, the unified proof-graph model
//! they both build, post-binding semantic checks, and bridge detection
//! (spec §4.3). Name binding itself — turning a dummy node's name into the
//! pfsc entity it designates — is `pfsc-resolver`'s job; this crate exposes
//! [`semantic::NodeSemantics`] as the seam between the two.

mod arclang;
mod bridges;
mod graph;
mod meson;
mod semantic;

pub use arclang::build_graph_from_arcs;
pub use bridges::{find_and_mark_bridges, mark_flow_link_outs_as_bridges};
pub use graph::{Edge, EdgeKind, Graph, GraphSource, Node};
pub use meson::build_graph_from_meson;
pub use semantic::{semantic_check, NodeSemantics};
