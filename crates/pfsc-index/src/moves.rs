//! Move resolution: explicit `(src, dst)` pairs from a release's change log
//! propagate to every descendant of `src`, without a per-descendant record
//! (spec §3.12, §4.7).
//!
//! Grounded on `original_source/server/pfsc/gdb/writer.py::ix0330`'s note
//! that only explicitly-listed moves are recorded, "all the rest can be
//! inferred" by walking `UNDER` containment up from a node to find the
//! first ancestor with a recorded move. Since libpaths are themselves
//! dotted containment paths, that walk collapses to a longest-prefix match
//! over `move_mapping`'s keys.

use std::collections::HashMap;

/// `None` in the map value means the source was deleted (moved to `VOID`).
pub type MoveMapping = HashMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// `libpath` is not a descendant of any moved/deleted libpath.
    Unaffected,
    /// `libpath` (or an ancestor of it) was deleted.
    Deleted,
    /// `libpath`'s move-conjugate under the new version.
    MovedTo(String),
}

/// Finds the move-conjugate of `libpath`: walks up through dot-separated
/// prefixes of `libpath` looking for the longest one recorded in
/// `move_mapping`, then re-appends whatever suffix remains past that prefix.
pub fn find_move_conjugate(libpath: &str, move_mapping: &MoveMapping) -> MoveOutcome {
    let segs: Vec<&str> = libpath.split('.').collect();
    for n in (1..=segs.len()).rev() {
        let prefix = segs[..n].join(".");
        if let Some(dst) = move_mapping.get(&prefix) {
            return match dst {
                None => MoveOutcome::Deleted,
                Some(d) => MoveOutcome::MovedTo(format!("{d}{}", &libpath[prefix.len()..])),
            };
        }
    }
    MoveOutcome::Unaffected
}

/// Builds `mm_closure`: the move-conjugate of every libpath in
/// `affected_libpaths` (typically every existing libpath under a touched
/// module at the previous major) that is actually affected by a move.
pub fn build_mm_closure(move_mapping: &MoveMapping, affected_libpaths: &[String]) -> MoveMapping {
    let mut closure = HashMap::new();
    for lp in affected_libpaths {
        match find_move_conjugate(lp, move_mapping) {
            MoveOutcome::Unaffected => {}
            MoveOutcome::Deleted => {
                closure.insert(lp.clone(), None);
            }
            MoveOutcome::MovedTo(dst) => {
                closure.insert(lp.clone(), Some(dst));
            }
        }
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_move_resolves_directly() {
        let mut mm = HashMap::new();
        mm.insert("a.b.Old".to_string(), Some("a.b.New".to_string()));
        assert_eq!(find_move_conjugate("a.b.Old", &mm), MoveOutcome::MovedTo("a.b.New".to_string()));
    }

    #[test]
    fn descendant_of_moved_ancestor_inherits_the_move() {
        let mut mm = HashMap::new();
        mm.insert("a.b.Old".to_string(), Some("a.b.New".to_string()));
        assert_eq!(find_move_conjugate("a.b.Old.sub", &mm), MoveOutcome::MovedTo("a.b.New.sub".to_string()));
    }

    #[test]
    fn deleted_ancestor_marks_descendants_deleted() {
        let mut mm = HashMap::new();
        mm.insert("a.b.Gone".to_string(), None);
        assert_eq!(find_move_conjugate("a.b.Gone.sub", &mm), MoveOutcome::Deleted);
    }

    #[test]
    fn unrelated_libpath_is_unaffected() {
        let mut mm = HashMap::new();
        mm.insert("a.b.Old".to_string(), Some("a.b.New".to_string()));
        assert_eq!(find_move_conjugate("a.b.Other", &mm), MoveOutcome::Unaffected);
    }

    #[test]
    fn closure_only_contains_affected_libpaths() {
        let mut mm = HashMap::new();
        mm.insert("a.b.Old".to_string(), Some("a.b.New".to_string()));
        let closure = build_mm_closure(&mm, &["a.b.Old.sub".to_string(), "a.b.Unrelated".to_string()]);
        assert_eq!(closure.len(), 1);
        assert_eq!(closure["a.b.Old.sub"], Some("a.b.New.sub".to_string()));
    }
}
