//! Assembles a deduction's full dashgraph document: metadata, per-node
//! fields, edges, recursive children, and logical node order (spec §4.6).
//!
//! Grounded on `codegraph-prep/src/export/jsonl.rs`/`graphml.rs`: both walk
//! an in-memory model and emit one concrete JSON/GraphML document rather
//! than serializing the model type directly, which is the same shape this
//! builder follows.

use crate::edges::{build_edges_json, build_node_order_json};
use crate::node::NodeMeta;
use pfsc_meson::Graph;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DeducMeta {
    pub libpath: String,
    pub version: String,
    pub deduction: String,
    pub friendly_name: Option<String>,
    pub target_deduc: Option<String>,
    pub target_version: Option<String>,
    pub target_subdeduc: Option<String>,
    pub targets: Vec<String>,
    pub running_defs: Vec<String>,
    pub doc_info: Option<Value>,
    pub text_range: Option<(u32, u32)>,
}

/// `nodes` keys by node name (matching `graph`'s node names); `children`
/// keys by child libpath and holds that child's own already-built
/// sub-dashgraph document.
pub fn build_dashgraph(
    meta: &DeducMeta,
    graph: &Graph,
    nodes: &HashMap<String, NodeMeta>,
    children: &HashMap<String, Value>,
) -> Value {
    let mut nodes_json = Map::new();
    for (name, nm) in nodes {
        nodes_json.insert(name.clone(), nm.to_json());
    }
    let mut children_json = Map::new();
    for (libpath, child) in children {
        children_json.insert(libpath.clone(), child.clone());
    }

    json!({
        "libpath": meta.libpath,
        "version": meta.version,
        "deduction": meta.deduction,
        "friendly_name": meta.friendly_name,
        "target_deduc": meta.target_deduc,
        "target_version": meta.target_version,
        "target_subdeduc": meta.target_subdeduc,
        "targets": meta.targets,
        "runningDefs": meta.running_defs,
        "docInfo": meta.doc_info,
        "textRange": meta.text_range.map(|(a, b)| json!([a, b])),
        "nodes": Value::Object(nodes_json),
        "edges": build_edges_json(graph),
        "children": Value::Object(children_json),
        "nodeOrder": build_node_order_json(graph),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use pfsc_meson::{EdgeKind, GraphSource};

    #[test]
    fn dashgraph_carries_metadata_and_edges() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("p1", "c1", EdgeKind::Ded);
        let mut nodes = HashMap::new();
        nodes.insert(
            "p1".to_string(),
            NodeMeta { label_html: "<p>p1</p>".to_string(), nodetype: "supp".to_string(), kind: NodeKind::Plain, ..Default::default() },
        );
        let meta = DeducMeta {
            libpath: "a.b.Thm".to_string(),
            version: "1.0.0".to_string(),
            deduction: "Thm".to_string(),
            targets: vec!["a.b.Lemma".to_string()],
            ..Default::default()
        };
        let doc = build_dashgraph(&meta, &g, &nodes, &HashMap::new());
        assert_eq!(doc["libpath"], "a.b.Thm");
        assert_eq!(doc["edges"].as_array().unwrap().len(), 1);
        assert_eq!(doc["nodes"]["p1"]["nodetype"], "supp");
    }

    #[test]
    fn dashgraph_embeds_children_by_libpath() {
        let g = Graph::new(GraphSource::Arcs);
        let mut children = HashMap::new();
        children.insert("a.b.Thm.sub1".to_string(), json!({"deduction": "sub1"}));
        let meta = DeducMeta { libpath: "a.b.Thm".to_string(), ..Default::default() };
        let doc = build_dashgraph(&meta, &g, &HashMap::new(), &children);
        assert_eq!(doc["children"]["a.b.Thm.sub1"]["deduction"], "sub1");
    }
}
