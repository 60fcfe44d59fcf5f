//! `ModuleIndexInfo` and the write-path diff algorithm: ISOLATED mode for
//! WIP rebuilds, DIFFERENTIAL mode (symmetric difference keyed by uid) for
//! numbered releases (spec §4.7).
//!
//! Grounded on `original_source/server/pfsc/gdb/writer.py`'s `ix0100`-
//! `ix0400` phase split: `ix0100` clears WIP indexing (ISOLATED mode needs
//! nothing else, since dropping a module's WIP nodes transitively drops
//! their edges); `ix0200` is this module's `diff_differential`/
//! `diff_isolated`.

use crate::types::{EdgeUid, KNode, KReln, NodeUid};
use pfsc_path::Version;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    pub moved: Vec<(String, String)>,
    pub deletions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModuleIndexInfo {
    pub repopath: String,
    pub version: Version,
    pub major: u32,
    pub commit_hash: String,
    pub recursive: bool,
    pub change_log: ChangeLog,
}

impl ModuleIndexInfo {
    pub fn is_wip(&self) -> bool {
        self.version == Version::Wip
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    pub v_add: Vec<KNode>,
    pub v_cut: Vec<NodeUid>,
    pub e_add: Vec<KReln>,
    pub e_cut: Vec<EdgeUid>,
}

/// ISOLATED mode: every node/edge in the freshly-built set is added outright.
/// The caller is responsible for having already dropped the module's
/// existing WIP nodes (which transitively drops their edges) before this
/// runs — that's `ix0100`'s job, not the diff's.
pub fn diff_isolated(new_nodes: Vec<KNode>, new_edges: Vec<KReln>) -> DiffResult {
    DiffResult { v_add: new_nodes, v_cut: Vec::new(), e_add: new_edges, e_cut: Vec::new() }
}

/// DIFFERENTIAL mode: symmetric difference, keyed by uid, between the
/// existing entities at the previous major and the freshly-built set.
pub fn diff_differential(
    old_nodes: &HashMap<NodeUid, KNode>,
    new_nodes: &[KNode],
    old_edges: &HashMap<EdgeUid, KReln>,
    new_edges: &[KReln],
) -> DiffResult {
    let new_node_uids: HashSet<&NodeUid> = new_nodes.iter().map(|n| &n.uid).collect();
    let new_edge_uids: HashSet<&EdgeUid> = new_edges.iter().map(|e| &e.uid).collect();

    let v_add = new_nodes.iter().filter(|n| !old_nodes.contains_key(&n.uid)).cloned().collect();
    let v_cut = old_nodes.keys().filter(|uid| !new_node_uids.contains(uid)).cloned().collect();
    let e_add = new_edges.iter().filter(|e| !old_edges.contains_key(&e.uid)).cloned().collect();
    let e_cut = old_edges.keys().filter(|uid| !new_edge_uids.contains(uid)).cloned().collect();

    DiffResult { v_add, v_cut, e_add, e_cut }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeType, NodeLabel};
    use serde_json::Map;

    fn node(libpath: &str, major: u32) -> KNode {
        KNode {
            uid: NodeUid::new(libpath, major),
            label: NodeLabel::Deduc,
            modpath: "a.b".to_string(),
            repopath: "a.b".to_string(),
            origin: None,
            cut: None,
            props: Map::new(),
        }
    }

    #[test]
    fn isolated_mode_adds_everything_and_cuts_nothing() {
        let nodes = vec![node("a.b.Thm", 0)];
        let result = diff_isolated(nodes.clone(), vec![]);
        assert_eq!(result.v_add, nodes);
        assert!(result.v_cut.is_empty());
    }

    #[test]
    fn differential_mode_adds_only_new_and_cuts_only_dropped() {
        let mut old_nodes = HashMap::new();
        old_nodes.insert(NodeUid::new("a.b.Thm", 1), node("a.b.Thm", 1));
        old_nodes.insert(NodeUid::new("a.b.Old", 1), node("a.b.Old", 1));

        let new_nodes = vec![node("a.b.Thm", 1), node("a.b.New", 2)];

        let result = diff_differential(&old_nodes, &new_nodes, &HashMap::new(), &[]);
        assert_eq!(result.v_add.len(), 1);
        assert_eq!(result.v_add[0].uid, NodeUid::new("a.b.New", 2));
        assert_eq!(result.v_cut, vec![NodeUid::new("a.b.Old", 1)]);
    }

    #[test]
    fn differential_mode_leaves_unchanged_nodes_alone() {
        let mut old_nodes = HashMap::new();
        old_nodes.insert(NodeUid::new("a.b.Thm", 1), node("a.b.Thm", 1));
        let new_nodes = vec![node("a.b.Thm", 1)];

        let result = diff_differential(&old_nodes, &new_nodes, &HashMap::new(), &[]);
        assert!(result.v_add.is_empty());
        assert!(result.v_cut.is_empty());
    }

    #[test]
    fn differential_mode_diffs_edges_too() {
        let tail = NodeUid::new("a.b.Thm", 1);
        let head = NodeUid::new("a.b.Lemma", 1);
        let edge_uid = EdgeUid { edge_type: EdgeType::Implies, tail: tail.clone(), head: head.clone() };
        let edge = KReln { uid: edge_uid.clone(), repopath: "a.b".to_string(), modpath: "a.b".to_string(), major: 1, cut: None, props: Map::new() };

        let mut old_edges = HashMap::new();
        old_edges.insert(edge_uid.clone(), edge.clone());

        let result = diff_differential(&HashMap::new(), &[], &old_edges, &[]);
        assert_eq!(result.e_cut, vec![edge_uid]);
    }
}
