//! The repo manifest: a record of everything a build produced, as a tree
//! model plus per-subtree build info and document descriptors (spec §4.6,
//! §6.2). Partial (non-root) rebuilds merge their manifest into the repo's
//! existing one rather than replacing it outright.

mod manifest;
mod tree;

pub use manifest::{BuildInfo, Manifest};
pub use tree::ManifestTreeNode;
