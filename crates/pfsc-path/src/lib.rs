//! Libpath and version algebra shared by every other `pfsc-*` crate.
//!
//! A libpath is the identifier scheme for everything in a pfsc repository
//! (modules, deductions, nodes, annotations, widgets); a version is either
//! the mutable `WIP` head or a numbered `major.minor.patch` release.

mod error;
mod libpath;
mod path_info;
mod version;

pub use error::{PathError, Result};
pub use libpath::{
    expand_multipath, parse_repo_versioned_libpath, Libpath, Origin, RepoVersionedLibpath,
    MAX_LIBPATH_LEN, MAX_LIBSEG_LEN,
};
pub use path_info::{FileSystem, PathInfo, PathKind};
pub use version::{MajorVersion, Version};
