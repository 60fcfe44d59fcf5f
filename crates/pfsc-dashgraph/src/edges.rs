//! Edge-array emission: the Meson/arc-listing graph's edges, tagged with
//! arrow style and bridge flag, plus the logical node order used for outline
//! views (spec §4.6).

use pfsc_meson::Graph;
use serde_json::{json, Value};

pub fn build_edges_json(graph: &Graph) -> Value {
    Value::Array(
        graph
            .edges()
            .iter()
            .map(|e| json!({ "src": e.src, "tgt": e.tgt, "style": e.kind.arrow(), "bridge": e.is_bridge }))
            .collect(),
    )
}

pub fn build_node_order_json(graph: &Graph) -> Value {
    Value::Array(graph.list_nodes_in_logical_order().iter().map(|n| json!(n.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_meson::{EdgeKind, GraphSource};

    #[test]
    fn edge_json_carries_style_and_bridge_flag() {
        let mut g = Graph::new(GraphSource::Arcs);
        let idx = g.create_edge("a", "b", EdgeKind::Ded);
        g.mark_bridge(idx);
        let edges = build_edges_json(&g);
        let arr = edges.as_array().unwrap();
        assert_eq!(arr[0]["style"], "-->");
        assert_eq!(arr[0]["bridge"], true);
    }

    #[test]
    fn node_order_lists_every_node() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        let order = build_node_order_json(&g);
        assert_eq!(order.as_array().unwrap().len(), 2);
    }
}
