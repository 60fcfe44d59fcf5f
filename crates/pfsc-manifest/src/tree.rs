//! The manifest tree model: one node per repo content item (module,
//! deduction, annotation, ...), carrying whatever typed metadata the builder
//! recorded for it (spec §4.6/§6.2).
//!
//! Grounded on `original_source/server/pfsc/build/manifest.py`'s
//! `ManifestTreeNode`: `id` is always also mirrored into the node's own
//! `data` under `libpath`, matching the original's `self.data['libpath'] =
//! id_` — frontend code reads it from there.

use pfsc_errors::PfscError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestTreeNode {
    pub id: String,
    pub data: Map<String, Value>,
    pub children: Vec<ManifestTreeNode>,
}

impl ManifestTreeNode {
    pub fn new(id: impl Into<String>, mut data: Map<String, Value>) -> Self {
        let id = id.into();
        data.insert("libpath".to_string(), Value::String(id.clone()));
        ManifestTreeNode { id, data, children: Vec::new() }
    }

    /// Builds just a tree node (and its descendants) from its dict repr.
    /// Consumes `d`: `id` and `children` are popped out, the rest becomes
    /// this node's data.
    pub fn from_dict(mut d: Map<String, Value>) -> Result<Self, PfscError> {
        let id = d
            .remove("id")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| PfscError::ManifestBadForm("tree node missing 'id'".to_string()))?;
        let children_val = d.remove("children");
        let mut node = ManifestTreeNode::new(id, d);
        if let Some(Value::Array(items)) = children_val {
            for item in items {
                let Value::Object(child_map) = item else {
                    return Err(PfscError::ManifestBadForm("child is not an object".to_string()));
                };
                node.children.push(ManifestTreeNode::from_dict(child_map)?);
            }
        }
        Ok(node)
    }

    pub fn to_dict(&self) -> Value {
        let mut d = self.data.clone();
        d.insert("id".to_string(), Value::String(self.id.clone()));
        if !self.children.is_empty() {
            d.insert("children".to_string(), Value::Array(self.children.iter().map(ManifestTreeNode::to_dict).collect()));
        }
        Value::Object(d)
    }

    pub fn set_data_property(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn add_child(&mut self, child: ManifestTreeNode) {
        self.children.push(child);
    }

    pub fn find(&self, id: &str) -> Option<&ManifestTreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Replaces the descendant node (never `self`) whose id matches `id`
    /// with `new_node`. Returns `new_node` back, unclaimed, if no match was
    /// found anywhere in this subtree.
    pub fn replace_descendant(&mut self, id: &str, new_node: ManifestTreeNode) -> Result<(), ManifestTreeNode> {
        for child in self.children.iter_mut() {
            if child.id == id {
                *child = new_node;
                return Ok(());
            }
        }
        let mut new_node = new_node;
        for child in self.children.iter_mut() {
            match child.replace_descendant(id, new_node) {
                Ok(()) => return Ok(()),
                Err(returned) => new_node = returned,
            }
        }
        Err(new_node)
    }

    /// Parses this node's id as a libpath, for callers that need the
    /// structured form (segment access, repo root, etc.).
    pub fn libpath(&self) -> Result<pfsc_path::Libpath, PfscError> {
        pfsc_path::Libpath::parse(&self.id).map_err(PfscError::from)
    }

    pub fn is_module(&self) -> bool {
        self.data.get("type").and_then(Value::as_str) == Some("MODULE")
    }

    pub fn get_submodules(&self) -> impl Iterator<Item = &ManifestTreeNode> {
        self.children.iter().filter(|c| c.is_module())
    }

    pub fn get_contents(&self) -> impl Iterator<Item = &ManifestTreeNode> {
        self.children.iter().filter(|c| !c.is_module())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn from_dict_to_dict_round_trips() {
        let d = json!({
            "id": "a.b",
            "type": "MODULE",
            "children": [
                { "id": "a.b.Thm", "type": "DEDUC" }
            ]
        });
        let node = ManifestTreeNode::from_dict(obj(d.clone())).unwrap();
        assert_eq!(node.id, "a.b");
        assert_eq!(node.data["libpath"], "a.b");
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].id, "a.b.Thm");

        let back = node.to_dict();
        assert_eq!(back["id"], "a.b");
        assert_eq!(back["children"][0]["id"], "a.b.Thm");
    }

    #[test]
    fn leaf_node_omits_empty_children_key() {
        let node = ManifestTreeNode::new("a.b.Thm", Map::new());
        let d = node.to_dict();
        assert!(d.get("children").is_none());
    }

    #[test]
    fn find_locates_nested_descendant() {
        let mut root = ManifestTreeNode::new("a", Map::new());
        root.add_child(ManifestTreeNode::new("a.b", Map::new()));
        assert!(root.find("a.b").is_some());
        assert!(root.find("a.c").is_none());
    }

    #[test]
    fn replace_descendant_swaps_matching_subtree() {
        let mut root = ManifestTreeNode::new("a", Map::new());
        root.add_child(ManifestTreeNode::new("a.b", Map::new()));
        let replacement = ManifestTreeNode::new("a.b", Map::new());
        assert!(root.replace_descendant("a.b", replacement).is_ok());
    }

    #[test]
    fn libpath_parses_the_node_id() {
        let node = ManifestTreeNode::new("a.b.Thm", Map::new());
        assert_eq!(node.libpath().unwrap().as_str(), "a.b.Thm");
    }

    #[test]
    fn replace_descendant_returns_node_when_not_found() {
        let mut root = ManifestTreeNode::new("a", Map::new());
        let replacement = ManifestTreeNode::new("a.missing", Map::new());
        assert!(root.replace_descendant("a.missing", replacement).is_err());
    }
}
