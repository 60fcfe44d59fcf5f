//! Serializes a built deduction's proof graph and an annotation's rendered
//! body into the JSON documents the pfISE frontend consumes (spec §4.6).
//! Assembly — walking a module tree and its resolved nodes to produce the
//! values these builders accept — is `pfsc-builder`'s job; this crate only
//! knows how to turn already-resolved data into the documented shapes.

mod annotation;
mod convert;
mod dashgraph;
mod edges;
mod node;

pub use annotation::build_annotation;
pub use dashgraph::{build_dashgraph, DeducMeta};
pub use edges::{build_edges_json, build_node_order_json};
pub use node::{NodeKind, NodeMeta};
