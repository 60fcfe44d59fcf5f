//! Bridge detection: edges whose removal would disconnect the graph, found
//! by a Tarjan-style DFS that also treats containment (parent/child) as an
//! implicit edge, plus the flow-link special case (spec §4.3). Grounded on
//! `meson.py`'s `findAndMarkBridges`/`markFlowLinkOutsAsBridges`.

use crate::graph::Graph;
use crate::semantic::NodeSemantics;
use std::collections::{HashMap, HashSet};

fn compute_containment_nbrs(graph: &Graph, sem: &dyn NodeSemantics) -> HashMap<String, HashSet<String>> {
    let all_names: HashSet<String> = graph.nodes().iter().map(|n| n.name.clone()).collect();
    let mut nbrs: HashMap<String, HashSet<String>> = HashMap::new();
    for node in graph.nodes() {
        if let Some(parent_name) = sem.parent(&node.name) {
            if all_names.contains(&parent_name) {
                nbrs.entry(node.name.clone()).or_default().insert(parent_name.clone());
                nbrs.entry(parent_name).or_default().insert(node.name.clone());
            }
        }
    }
    nbrs
}

struct BridgeSearch<'g> {
    graph: &'g Graph,
    c_nbrs: HashMap<String, HashSet<String>>,
    first_enc: HashMap<String, i64>,
    min_reach: HashMap<String, i64>,
    unvisited: HashSet<String>,
    count: i64,
    bridges: HashSet<usize>,
}

impl<'g> BridgeSearch<'g> {
    fn neighbor_names(&self, name: &str) -> Vec<String> {
        let mut set: HashSet<String> = self
            .graph
            .get_node(name)
            .map(|n| n.nbr_names.iter().cloned().collect())
            .unwrap_or_default();
        if let Some(extra) = self.c_nbrs.get(name) {
            set.extend(extra.iter().cloned());
        }
        set.into_iter().collect()
    }

    /// Mirrors `bridge_search(a, b)` in the original: `a` is the node we
    /// arrived from (so we don't walk straight back along the edge we
    /// came in on), `b` is the node currently being visited.
    fn search(&mut self, a: &str, b: &str) {
        self.count += 1;
        self.first_enc.insert(b.to_string(), self.count);
        self.min_reach.insert(b.to_string(), self.count);

        for c in self.neighbor_names(b) {
            if self.first_enc.get(&c).copied().unwrap_or(-1) < 0 {
                self.unvisited.remove(&c);
                self.search(b, &c);
                let mr = self.min_reach[b].min(self.min_reach[&c]);
                self.min_reach.insert(b.to_string(), mr);
                if self.min_reach[&c] == self.first_enc[&c] {
                    if let Some(e) = self.graph.edge_between(b, &c) {
                        let idx = self.edge_index_of(e);
                        self.bridges.insert(idx);
                    }
                }
            } else if a != c {
                let mr = self.min_reach[b].min(self.first_enc[&c]);
                self.min_reach.insert(b.to_string(), mr);
            }
        }
    }

    fn edge_index_of(&self, target: &crate::graph::Edge) -> usize {
        self.graph
            .edges()
            .iter()
            .position(|e| std::ptr::eq(e, target))
            .expect("edge must belong to this graph")
    }
}

/// Runs the bridge DFS and marks discovered bridges on `graph`'s edges.
/// Returns the set of bridge edge indices.
pub fn find_and_mark_bridges(graph: &mut Graph, sem: &dyn NodeSemantics) -> HashSet<usize> {
    let c_nbrs = compute_containment_nbrs(graph, sem);
    let all_names: Vec<String> = graph.nodes().iter().map(|n| n.name.clone()).collect();
    let mut search = BridgeSearch {
        graph: &*graph,
        c_nbrs,
        first_enc: all_names.iter().map(|n| (n.clone(), -1)).collect(),
        min_reach: all_names.iter().map(|n| (n.clone(), -1)).collect(),
        unvisited: all_names.iter().cloned().collect(),
        count: 0,
        bridges: HashSet::new(),
    };

    while let Some(start) = search.unvisited.iter().next().cloned() {
        search.unvisited.remove(&start);
        search.search(&start, &start);
    }

    let bridges = search.bridges;
    for &idx in &bridges {
        graph.mark_bridge(idx);
    }
    bridges
}

/// Marks the outgoing edge of every flow-link node (degree-2, one incoming
/// and one outgoing flow edge) as a bridge, even if it wasn't found to be
/// one by the DFS: this prevents layout from suppressing a visually
/// important link.
pub fn mark_flow_link_outs_as_bridges(graph: &mut Graph) -> HashSet<usize> {
    let marked: Vec<usize> = graph
        .nodes()
        .iter()
        .filter_map(|n| if n.is_flow_link() { n.outflow_edge } else { None })
        .collect();
    for &idx in &marked {
        graph.mark_bridge(idx);
    }
    marked.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphSource};

    struct NoSem;
    impl NodeSemantics for NoSem {
        fn is_modal(&self, _: &str) -> bool {
            false
        }
        fn is_subdeduc(&self, _: &str) -> bool {
            false
        }
        fn ghost_of(&self, _: &str) -> Option<String> {
            None
        }
        fn libpath(&self, name: &str) -> String {
            name.to_string()
        }
        fn declared_locally(&self, _: &str) -> bool {
            true
        }
        fn parent(&self, _: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn single_edge_chain_is_all_bridges() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        g.create_edge("b", "c", EdgeKind::Ded);
        let bridges = find_and_mark_bridges(&mut g, &NoSem);
        assert_eq!(bridges.len(), 2);
    }

    #[test]
    fn cycle_has_no_bridges() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        g.create_edge("b", "c", EdgeKind::Ded);
        g.create_edge("c", "a", EdgeKind::Ded);
        let bridges = find_and_mark_bridges(&mut g, &NoSem);
        assert!(bridges.is_empty());
    }

    #[test]
    fn flow_link_out_edge_marked() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Flow);
        g.create_edge("b", "c", EdgeKind::Flow);
        let marked = mark_flow_link_outs_as_bridges(&mut g);
        assert_eq!(marked.len(), 1);
        assert!(g.edges()[*marked.iter().next().unwrap()].is_bridge);
    }
}
