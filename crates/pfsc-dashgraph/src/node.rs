//! Per-node dashgraph fields: the common envelope every node carries, plus
//! the type-specific extras for ghost, flse, supp and quantifier nodes
//! (spec §4.6).

use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub enum NodeKind {
    Plain,
    Ghost {
        ghost_of: String,
        real_obj: String,
        real_origin: Option<String>,
        fwd_rel_path: String,
        xpan_seq: Option<u32>,
    },
    Flse {
        contra: Vec<String>,
    },
    Supp {
        alternates: Vec<String>,
        wolog: bool,
    },
    Quantifier {
        typenode_uids: Vec<String>,
        propnode_uids: Vec<String>,
    },
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Plain
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    pub label_html: String,
    pub nodetype: String,
    pub origin: Option<String>,
    pub intra_deduc_path: String,
    pub clone_of: Option<String>,
    pub kind: NodeKind,
}

impl NodeMeta {
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("labelHTML".to_string(), json!(self.label_html));
        map.insert("nodetype".to_string(), json!(self.nodetype));
        map.insert("origin".to_string(), json!(self.origin));
        map.insert("intraDeducPath".to_string(), json!(self.intra_deduc_path));
        if let Some(c) = &self.clone_of {
            map.insert("cloneOf".to_string(), json!(c));
        }
        match &self.kind {
            NodeKind::Plain => {}
            NodeKind::Ghost { ghost_of, real_obj, real_origin, fwd_rel_path, xpan_seq } => {
                map.insert("ghostOf".to_string(), json!(ghost_of));
                map.insert("realObj".to_string(), json!(real_obj));
                map.insert("realOrigin".to_string(), json!(real_origin));
                map.insert("fwdRelPath".to_string(), json!(fwd_rel_path));
                map.insert("xpanSeq".to_string(), json!(xpan_seq));
            }
            NodeKind::Flse { contra } => {
                map.insert("contra".to_string(), json!(contra));
            }
            NodeKind::Supp { alternates, wolog } => {
                map.insert("alternates".to_string(), json!(alternates));
                map.insert("wolog".to_string(), json!(wolog));
            }
            NodeKind::Quantifier { typenode_uids, propnode_uids } => {
                map.insert("typenodeUIDs".to_string(), json!(typenode_uids));
                map.insert("propnodeUIDs".to_string(), json!(propnode_uids));
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_node_has_no_type_specific_fields() {
        let nm = NodeMeta { label_html: "x".to_string(), nodetype: "ded".to_string(), ..Default::default() };
        let v = nm.to_json();
        assert!(v.get("ghostOf").is_none());
        assert!(v.get("contra").is_none());
    }

    #[test]
    fn ghost_node_carries_ghost_fields() {
        let nm = NodeMeta {
            label_html: "x".to_string(),
            nodetype: "ghost".to_string(),
            kind: NodeKind::Ghost {
                ghost_of: "a.b.Thm.p1".to_string(),
                real_obj: "a.b.Thm".to_string(),
                real_origin: Some("a.b@1".to_string()),
                fwd_rel_path: "p1".to_string(),
                xpan_seq: Some(0),
            },
            ..Default::default()
        };
        let v = nm.to_json();
        assert_eq!(v["ghostOf"], "a.b.Thm.p1");
        assert_eq!(v["xpanSeq"], 0);
    }

    #[test]
    fn supp_node_carries_alternates_and_wolog() {
        let nm = NodeMeta {
            label_html: "x".to_string(),
            nodetype: "supp".to_string(),
            kind: NodeKind::Supp { alternates: vec!["s2".to_string()], wolog: true },
            ..Default::default()
        };
        let v = nm.to_json();
        assert_eq!(v["alternates"][0], "s2");
        assert_eq!(v["wolog"], true);
    }
}
