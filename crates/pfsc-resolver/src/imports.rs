//! Import resolution and cyclic-import detection (spec §4.4).
//!
//! Grounded on `codegraph-prep/src/graph/merge.rs`'s graph-walk shape,
//! adapted from symbol-merging to module-DAG traversal with an explicit
//! visiting set (the teacher's own cycle guard in `merge.rs` is the model
//! for ours).

use pfsc_errors::PfscError;
use pfsc_parser::{Import, Item, ModuleTree};
use std::collections::{HashMap, HashSet};

/// Resolves one `Import` against the module currently being read, returning
/// the absolute modpath it designates. Relative imports (leading `.`) are
/// resolved against `current_modpath`; `from LP import ...` yields one
/// target per named import in addition to `module`.
pub fn resolve_import_targets(current_modpath: &str, import: &Import) -> Vec<String> {
    match import {
        Import::Direct { libpath, .. } => vec![resolve_one(current_modpath, libpath)],
        Import::From { module, names, .. } => {
            let base = resolve_one(current_modpath, module);
            names.iter().map(|(name, _)| format!("{base}.{name}")).collect()
        }
    }
}

fn resolve_one(current_modpath: &str, libpath: &str) -> String {
    if let Some(rest) = libpath.strip_prefix('.') {
        let mut up = 1usize;
        let mut trailing = rest;
        while let Some(r) = trailing.strip_prefix('.') {
            up += 1;
            trailing = r;
        }
        let mut segs: Vec<&str> = current_modpath.split('.').collect();
        for _ in 0..up {
            segs.pop();
        }
        if trailing.is_empty() {
            segs.join(".")
        } else {
            segs.push(trailing);
            segs.join(".")
        }
    } else {
        libpath.to_string()
    }
}

/// Returns the direct import-targets of a parsed module, in declaration
/// order.
pub fn direct_dependencies(modpath: &str, tree: &ModuleTree) -> Vec<String> {
    tree.items
        .iter()
        .filter_map(|item| match item {
            Item::Import(imp) => Some(resolve_import_targets(modpath, imp)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Walks the module DAG from every module in `modules`, raising a cyclic-
/// import error on re-entry to a node already on the current DFS stack.
/// `modules` maps modpath -> parsed tree, restricted to modules this build
/// actually has in hand (cross-repo dependencies are assumed acyclic by
/// construction: they're pinned to already-built, immutable versions).
pub fn check_no_cyclic_imports(modules: &HashMap<String, ModuleTree>) -> Result<(), PfscError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();
    let mut on_stack: HashSet<String> = HashSet::new();

    for modpath in modules.keys() {
        if !visited.contains(modpath) {
            visit(modpath, modules, &mut visited, &mut stack, &mut on_stack)?;
        }
    }
    Ok(())
}

fn visit(
    modpath: &str,
    modules: &HashMap<String, ModuleTree>,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
    on_stack: &mut HashSet<String>,
) -> Result<(), PfscError> {
    visited.insert(modpath.to_string());
    stack.push(modpath.to_string());
    on_stack.insert(modpath.to_string());

    if let Some(tree) = modules.get(modpath) {
        for dep in direct_dependencies(modpath, tree) {
            if dep == modpath {
                return Err(PfscError::CyclicImportError(modpath.to_string()));
            }
            if on_stack.contains(&dep) {
                return Err(PfscError::CyclicImportError(format!("{modpath} -> {dep}")));
            }
            if !visited.contains(&dep) && modules.contains_key(&dep) {
                visit(&dep, modules, visited, stack, on_stack)?;
            }
        }
    }

    stack.pop();
    on_stack.remove(modpath);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_parser::parse_module;

    #[test]
    fn resolves_relative_single_dot_to_sibling() {
        assert_eq!(resolve_one("a.b.c", ".d"), "a.b.d");
    }

    #[test]
    fn resolves_relative_double_dot_to_uncle() {
        assert_eq!(resolve_one("a.b.c", "..d"), "a.d");
    }

    #[test]
    fn absolute_import_passes_through() {
        assert_eq!(resolve_one("a.b.c", "x.y"), "x.y");
    }

    #[test]
    fn detects_direct_self_cycle() {
        let mut modules = HashMap::new();
        modules.insert("a.b".to_string(), parse_module("import a.b\n").unwrap());
        assert!(check_no_cyclic_imports(&modules).is_err());
    }

    #[test]
    fn detects_mutual_cycle() {
        let mut modules = HashMap::new();
        modules.insert("a".to_string(), parse_module("import b\n").unwrap());
        modules.insert("b".to_string(), parse_module("import a\n").unwrap());
        assert!(check_no_cyclic_imports(&modules).is_err());
    }

    #[test]
    fn acyclic_dag_is_accepted() {
        let mut modules = HashMap::new();
        modules.insert("a".to_string(), parse_module("import b\n").unwrap());
        modules.insert("b".to_string(), parse_module("x = 1\n").unwrap());
        assert!(check_no_cyclic_imports(&modules).is_ok());
    }
}
