//! The unified graph model shared by the Meson and arc-listing parsers.
//! Grounded on `original_source/server/pfsc/lang/meson.py`'s `Graph`/`Node`/
//! `Edge` classes: dummy nodes are named by plain strings here too, since
//! binding a name to its actual entity is the resolver's job, not this
//! crate's (spec §4.3/§4.4 split).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Ded,
    Flow,
}

impl EdgeKind {
    pub fn arrow(&self) -> &'static str {
        match self {
            EdgeKind::Ded => "-->",
            EdgeKind::Flow => "..>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSource {
    Meson,
    Arcs,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub seq_num: u32,
    pub first_occurs_in_supposition: bool,
    pub declared_locally: bool,
    pub nbr_names: Vec<String>,
    pub target_names: Vec<String>,
    pub inflow_edge: Option<usize>,
    pub outflow_edge: Option<usize>,
}

impl Node {
    fn new(name: String, seq_num: u32) -> Self {
        Node {
            name,
            seq_num,
            first_occurs_in_supposition: false,
            declared_locally: false,
            nbr_names: Vec::new(),
            target_names: Vec::new(),
            inflow_edge: None,
            outflow_edge: None,
        }
    }

    /// Degree-2 node both of whose incident edges are flow edges.
    pub fn is_flow_link(&self) -> bool {
        self.nbr_names.len() == 2 && self.inflow_edge.is_some() && self.outflow_edge.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub src: String,
    pub tgt: String,
    pub kind: EdgeKind,
    pub is_bridge: bool,
}

impl Edge {
    pub fn other(&self, name: &str) -> &str {
        if name == self.tgt {
            &self.src
        } else {
            &self.tgt
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub src_type: Option<GraphSource>,
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// (src, tgt) -> edge index, both directions recorded, mirroring
    /// `edgesByEndpts`.
    edges_by_endpts: HashMap<(String, String), usize>,
    node_seq: u32,
}

impl Graph {
    pub fn new(src_type: GraphSource) -> Self {
        Graph { src_type: Some(src_type), ..Default::default() }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    fn get_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.node_index.get(name).copied().map(move |i| &mut self.nodes[i])
    }

    pub fn create_node(&mut self, name: &str) -> usize {
        if let Some(&i) = self.node_index.get(name) {
            return i;
        }
        let node = Node::new(name.to_string(), self.node_seq);
        self.node_seq += 1;
        let idx = self.nodes.len();
        self.node_index.insert(name.to_string(), idx);
        self.nodes.push(node);
        idx
    }

    /// Creates an edge from `p` to `q`, creating the nodes if absent.
    pub fn create_edge(&mut self, p: &str, q: &str, kind: EdgeKind) -> usize {
        self.create_node(p);
        self.create_node(q);
        let edge_idx = self.edges.len();
        self.edges.push(Edge { src: p.to_string(), tgt: q.to_string(), kind, is_bridge: false });

        if let Some(pn) = self.get_node_mut(p) {
            pn.nbr_names.push(q.to_string());
            pn.target_names.push(q.to_string());
            if kind == EdgeKind::Flow {
                pn.outflow_edge = Some(edge_idx);
            }
        }
        if let Some(qn) = self.get_node_mut(q) {
            qn.nbr_names.push(p.to_string());
            if kind == EdgeKind::Flow {
                qn.inflow_edge = Some(edge_idx);
            }
        }
        self.edges_by_endpts.insert((p.to_string(), q.to_string()), edge_idx);
        self.edges_by_endpts.insert((q.to_string(), p.to_string()), edge_idx);
        edge_idx
    }

    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges_by_endpts.get(&(a.to_string(), b.to_string())).map(|&i| &self.edges[i])
    }

    pub fn mark_bridge(&mut self, idx: usize) {
        self.edges[idx].is_bridge = true;
    }

    pub fn mark_first_occurs_in_supposition(&mut self, name: &str) {
        if let Some(n) = self.get_node_mut(name) {
            n.first_occurs_in_supposition = true;
        }
    }

    /// Deletes the edges at the given indices and inserts `(s, method)` and
    /// `(method, t)` edges for every distinct source `s` and target `t`
    /// among them — the method-node factoring step used when a `reason`
    /// clause is qualified by `applying`/`via` (spec §4.3).
    pub fn factor_edges_through_method(&mut self, edge_indices: &[usize], method_name: &str) {
        self.create_node(method_name);
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        for &idx in edge_indices {
            let e = &self.edges[idx];
            if !sources.contains(&e.src) {
                sources.push(e.src.clone());
            }
            if !targets.contains(&e.tgt) {
                targets.push(e.tgt.clone());
            }
        }
        // Soft-delete: mark as removed by leaving them in place is wrong for
        // dashgraph emission, so we rebuild edges/edges_by_endpts excluding them.
        let removed: std::collections::HashSet<usize> = edge_indices.iter().copied().collect();
        let kept: Vec<Edge> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, e)| e.clone())
            .collect();
        self.edges = kept;
        self.edges_by_endpts.clear();
        for (i, e) in self.edges.iter().enumerate() {
            self.edges_by_endpts.insert((e.src.clone(), e.tgt.clone()), i);
            self.edges_by_endpts.insert((e.tgt.clone(), e.src.clone()), i);
        }
        for s in &sources {
            self.create_edge(s, method_name, EdgeKind::Ded);
        }
        for t in &targets {
            self.create_edge(method_name, t, EdgeKind::Ded);
        }
    }

    /// Nodes in Lamport/outline order: if there is a deductive edge A --> B,
    /// A precedes B; otherwise original script order (`seq_num`) decides.
    pub fn list_nodes_in_logical_order(&self) -> Vec<&Node> {
        let mut v: Vec<&Node> = self.nodes.iter().collect();
        v.sort_by(|a, b| {
            if b.target_names.contains(&a.name) {
                std::cmp::Ordering::Less
            } else if a.target_names.contains(&b.name) {
                std::cmp::Ordering::Greater
            } else {
                a.seq_num.cmp(&b.seq_num)
            }
        });
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_edge_links_both_endpoints() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        assert!(g.get_node("a").unwrap().nbr_names.contains(&"b".to_string()));
        assert!(g.get_node("b").unwrap().nbr_names.contains(&"a".to_string()));
        assert!(g.edge_between("a", "b").is_some());
        assert!(g.edge_between("b", "a").is_some());
    }

    #[test]
    fn factor_edges_through_method_rewires() {
        let mut g = Graph::new(GraphSource::Meson);
        let e1 = g.create_edge("s1", "t", EdgeKind::Ded);
        let e2 = g.create_edge("s2", "t", EdgeKind::Ded);
        g.factor_edges_through_method(&[e1, e2], "m");
        assert!(g.edge_between("s1", "t").is_none());
        assert!(g.edge_between("s1", "m").is_some());
        assert!(g.edge_between("m", "t").is_some());
    }

    #[test]
    fn logical_order_respects_deduction_edges() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        let order = g.list_nodes_in_logical_order();
        let pos_a = order.iter().position(|n| n.name == "a").unwrap();
        let pos_b = order.iter().position(|n| n.name == "b").unwrap();
        assert!(pos_a < pos_b);
    }

    #[test]
    fn flow_link_detected() {
        let mut g = Graph::new(GraphSource::Meson);
        g.create_edge("a", "b", EdgeKind::Flow);
        g.create_edge("b", "c", EdgeKind::Flow);
        assert!(g.get_node("b").unwrap().is_flow_link());
        assert!(!g.get_node("a").unwrap().is_flow_link());
    }
}
