//! The manifest proper: a tree model plus the build info and doc infos
//! recorded against it, and the partial-rebuild merge operation (spec
//! §4.6/§6.2).
//!
//! Grounded on `original_source/server/pfsc/build/manifest.py`'s
//! `Manifest.merge`. The original locates the common ancestor by walking
//! parent pointers from the freshly-built node upward; since a Rust tree
//! owns its nodes outright (no back-pointers), we instead require the
//! rebuilt node's id to already exist somewhere in the existing tree (true
//! of every supported rebuild: recursive rebuild of an existing module, or
//! of the repo root) and fail with `ManifestBadForm` otherwise, same as the
//! original does when no common ancestor can be found.

use crate::tree::ManifestTreeNode;
use pfsc_errors::PfscError;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub time: String,
}

impl BuildInfo {
    fn to_json(&self) -> Value {
        serde_json::json!({ "version": self.version, "commit": self.commit, "time": self.time })
    }

    fn from_json(v: &Value) -> Result<Self, PfscError> {
        let get = |k: &str| -> Result<String, PfscError> {
            v.get(k)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| PfscError::ManifestBadForm(format!("build info missing '{k}'")))
        };
        Ok(BuildInfo { version: get("version")?, commit: get("commit")?, time: get("time")? })
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub root: ManifestTreeNode,
    pub build_info: HashMap<String, BuildInfo>,
    pub doc_infos: Map<String, Value>,
}

impl Manifest {
    pub fn new(root: ManifestTreeNode) -> Self {
        Manifest { root, build_info: HashMap::new(), doc_infos: Map::new() }
    }

    /// Builds a complete manifest (tree model plus build info) from its dict
    /// repr, as written by [`Manifest::to_dict`].
    pub fn from_dict(mut d: Map<String, Value>) -> Result<Self, PfscError> {
        let tree_model = d
            .remove("tree_model")
            .and_then(|v| if let Value::Object(m) = v { Some(m) } else { None })
            .ok_or_else(|| PfscError::ManifestBadForm("manifest missing 'tree_model'".to_string()))?;
        let root = ManifestTreeNode::from_dict(tree_model)?;
        let mut manifest = Manifest::new(root);

        if let Some(Value::Object(build)) = d.remove("build") {
            for (libpath, info) in build {
                manifest.build_info.insert(libpath, BuildInfo::from_json(&info)?);
            }
        }
        if let Some(Value::Object(doc_info)) = d.remove("doc_info") {
            manifest.doc_infos = doc_info;
        }
        Ok(manifest)
    }

    pub fn to_dict(&self) -> Value {
        let mut d = Map::new();
        if !self.build_info.is_empty() {
            let build: Map<String, Value> = self.build_info.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
            d.insert("build".to_string(), Value::Object(build));
        }
        d.insert("doc_info".to_string(), Value::Object(self.doc_infos.clone()));
        d.insert("tree_model".to_string(), self.root.to_dict());
        Value::Object(d)
    }

    pub fn is_single_build(&self) -> bool {
        self.build_info.len() == 1
    }

    pub fn version(&self) -> Option<&str> {
        self.build_info.values().next().map(|b| b.version.as_str())
    }

    pub fn set_build_info(&mut self, libpath: &str, version: &str, commit: &str, time: &str) {
        let mut build_info = HashMap::new();
        build_info.insert(libpath.to_string(), BuildInfo { version: version.to_string(), commit: commit.to_string(), time: time.to_string() });
        self.build_info = build_info;
    }

    pub fn add_doc_info(&mut self, doc_id: &str, info: Value) {
        self.doc_infos.insert(doc_id.to_string(), info);
    }

    pub fn get(&self, id: &str) -> Option<&ManifestTreeNode> {
        self.root.find(id)
    }

    /// Merges the result of a single, partial rebuild into this manifest:
    /// replaces the rebuilt subtree, folds in its build/doc info, and drops
    /// any stale build-info entries for libpaths under the rebuilt one.
    pub fn merge(&mut self, other: Manifest) -> Result<(), PfscError> {
        if !other.is_single_build() {
            return Err(PfscError::ManifestBadForm(
                "cannot merge: other manifest must represent a single build".to_string(),
            ));
        }
        let (built_libpath, build_info) = other.build_info.into_iter().next().unwrap();

        self.build_info.retain(|k, _| {
            !(k == &built_libpath || (k.starts_with(built_libpath.as_str()) && k.as_bytes().get(built_libpath.len()) == Some(&b'.')))
        });
        self.build_info.insert(built_libpath.clone(), build_info);

        for (k, v) in other.doc_infos {
            self.doc_infos.insert(k, v);
        }

        if self.root.id == built_libpath {
            self.root = other.root;
        } else {
            self.root.replace_descendant(&built_libpath, other.root).map_err(|_| {
                PfscError::ManifestBadForm(format!(
                    "cannot merge manifests: no existing node for {built_libpath}; rebuild the repo recursively from its root"
                ))
            })?;
        }
        Ok(())
    }
}
