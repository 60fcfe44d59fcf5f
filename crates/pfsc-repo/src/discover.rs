//! `.pfsc` module discovery over a repository checkout (spec §6.1).
//!
//! Grounded on `codegraph-prep`/`code-indexer`/`graph-prepare`'s direct use
//! of `walkdir::WalkDir` for source-tree traversal, adapted to the
//! discovery rules spec.md §6.1 names: dotfiles/dot-directories are
//! ignored, `__.pfsc` is a directory's own module, and a module name must
//! not be used with more than one extension in the same directory — which,
//! since a subdirectory is itself an implicit module namespace, means a
//! leaf `Foo.pfsc` may not coexist with a `Foo/` subdirectory in the same
//! parent.

use pfsc_errors::{PfscError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DIRECTORY_MODULE_FILE: &str = "__.pfsc";
pub const MODULE_EXTENSION: &str = "pfsc";

/// A discovered module file, plus whether it's a directory's own module
/// (`__.pfsc`) as opposed to a leaf module file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    pub path: PathBuf,
    pub is_directory_module: bool,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

fn is_skipped(entry: &walkdir::DirEntry, skip_list: &[String]) -> bool {
    entry.file_name().to_str().map(|s| skip_list.iter().any(|skip| skip == s)).unwrap_or(false)
}

/// Walks `root`, returning every discovered `.pfsc` module. `skip_list`
/// names directories/files (by bare name) to ignore in addition to
/// anything dotfile-hidden.
pub fn discover_modules(root: &Path, skip_list: &[String]) -> Result<Vec<DiscoveredModule>> {
    let mut modules = Vec::new();
    let mut dir_children: HashMap<PathBuf, Vec<(String, bool)>> = HashMap::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (!is_hidden(e) && !is_skipped(e, skip_list)));

    for entry in walker {
        let entry = entry.map_err(|e| PfscError::Internal(e.to_string()))?;
        if entry.depth() == 0 {
            continue;
        }
        let Some(parent) = entry.path().parent() else { continue };
        let Some(name) = entry.file_name().to_str() else { continue };

        if entry.file_type().is_dir() {
            dir_children.entry(parent.to_path_buf()).or_default().push((name.to_string(), true));
            continue;
        }
        if name == DIRECTORY_MODULE_FILE {
            modules.push(DiscoveredModule { path: entry.path().to_path_buf(), is_directory_module: true });
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else { continue };
        if ext != MODULE_EXTENSION {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        dir_children.entry(parent.to_path_buf()).or_default().push((stem.to_string(), false));
        modules.push(DiscoveredModule { path: path.to_path_buf(), is_directory_module: false });
    }

    for (dir, children) in &dir_children {
        let mut by_name: HashMap<&str, Vec<bool>> = HashMap::new();
        for (name, is_dir) in children {
            by_name.entry(name.as_str()).or_default().push(*is_dir);
        }
        for (name, kinds) in by_name {
            let has_dir = kinds.iter().any(|k| *k);
            let has_file = kinds.iter().any(|k| !*k);
            if has_dir && has_file {
                return Err(PfscError::DuplicateModuleExtension(format!("{name} in {}", dir.display())));
            }
        }
    }

    Ok(modules)
}
