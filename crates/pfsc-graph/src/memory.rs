//! In-process `GraphWriter`/`GraphReader` binding: the index lives in a
//! `petgraph::graph::Graph<KNode, KReln>` guarded by a `tokio::sync::RwLock`,
//! grounded on `codegraph-prep/src/graph/merge.rs`'s pattern of pairing a
//! petgraph graph with a `HashMap<_, NodeIndex>` to look entities up by a
//! domain key instead of petgraph's own opaque index. Build artifacts
//! (module source, dashgraphs, annotations, manifests) are written under an
//! `artifact_root` directory instead of living in the graph, matching the
//! filesystem-artifact deployment spec §6.2 describes.

use crate::traits::{GraphReader, GraphWriter};
use async_trait::async_trait;
use pfsc_errors::{PfscError, Result};
use pfsc_index::{
    DiffResult, EdgeUid, KNode, KReln, ModuleIndexInfo, MoveMapping, MoveOutcome, NodeUid, NoteState, User,
};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    graph: Graph<KNode, KReln>,
    node_index: HashMap<NodeUid, NodeIndex>,
    edge_index: HashMap<EdgeUid, EdgeIndex>,
    indexed_versions: HashMap<String, Vec<String>>,
    move_mapping: MoveMapping,
    users: HashMap<String, User>,
    notes: HashMap<(String, String), (NoteState, String)>,
    approvals: HashMap<(String, String), bool>,
}

pub struct MemoryGraphStore {
    state: RwLock<State>,
    artifact_root: PathBuf,
}

impl MemoryGraphStore {
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        MemoryGraphStore { state: RwLock::new(State::default()), artifact_root: artifact_root.into() }
    }

    fn module_source_path(&self, modpath: &str, version: &str) -> PathBuf {
        self.artifact_root.join("module_source").join(modpath).join(format!("{version}.pfsc"))
    }

    fn dashgraph_path(&self, deducpath: &str, version: &str) -> PathBuf {
        self.artifact_root.join("dashgraphs").join(deducpath).join(format!("{version}.json"))
    }

    fn annotation_html_path(&self, annopath: &str, version: &str) -> PathBuf {
        self.artifact_root.join("annotations").join(annopath).join(format!("{version}.html"))
    }

    fn annotation_data_path(&self, annopath: &str, version: &str) -> PathBuf {
        self.artifact_root.join("annotations").join(annopath).join(format!("{version}.json"))
    }

    fn manifest_path(&self, repopath: &str, version: &str) -> PathBuf {
        self.artifact_root.join("manifests").join(repopath).join(format!("{version}.json"))
    }

    async fn write_file(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| PfscError::Internal(e.to_string()))?;
        }
        tokio::fs::write(path, contents).await.map_err(|e| PfscError::Internal(e.to_string()))
    }

    async fn read_file(path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PfscError::Internal(e.to_string())),
        }
    }

    async fn remove_dir(path: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PfscError::Internal(e.to_string())),
        }
    }
}

#[async_trait]
impl GraphWriter for MemoryGraphStore {
    async fn index_module(
        &self,
        mii: &ModuleIndexInfo,
        diff: DiffResult,
        moves: MoveMapping,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        for uid in &diff.v_cut {
            if let Some(&idx) = state.node_index.get(uid) {
                if let Some(node) = state.graph.node_weight_mut(idx) {
                    node.cut = Some(mii.major);
                }
            }
        }
        for uid in &diff.e_cut {
            if let Some(&idx) = state.edge_index.get(uid) {
                if let Some(edge) = state.graph.edge_weight_mut(idx) {
                    edge.cut = Some(mii.major);
                }
            }
        }
        for node in diff.v_add {
            let uid = node.uid.clone();
            let idx = state.graph.add_node(node);
            state.node_index.insert(uid, idx);
        }
        for edge in diff.e_add {
            let tail_idx = *state
                .node_index
                .get(&edge.uid.tail)
                .ok_or_else(|| PfscError::Internal(format!("edge tail {} not indexed", edge.uid.tail)))?;
            let head_idx = *state
                .node_index
                .get(&edge.uid.head)
                .ok_or_else(|| PfscError::Internal(format!("edge head {} not indexed", edge.uid.head)))?;
            let uid = edge.uid.clone();
            let idx = state.graph.add_edge(tail_idx, head_idx, edge);
            state.edge_index.insert(uid, idx);
        }
        state.move_mapping.extend(moves);

        let versions = state.indexed_versions.entry(mii.repopath.clone()).or_default();
        let v = mii.version.to_string();
        if !versions.contains(&v) {
            versions.push(v);
        }
        Ok(())
    }

    async fn record_module_source(&self, modpath: &str, version: &str, modtext: &str) -> Result<()> {
        Self::write_file(&self.module_source_path(modpath, version), modtext).await
    }

    async fn record_dashgraph(&self, deducpath: &str, version: &str, dashgraph: &Value) -> Result<()> {
        let contents = serde_json::to_string(dashgraph).map_err(|e| PfscError::Internal(e.to_string()))?;
        Self::write_file(&self.dashgraph_path(deducpath, version), &contents).await
    }

    async fn record_annobuild(
        &self,
        annopath: &str,
        version: &str,
        html: &str,
        data: &Value,
    ) -> Result<()> {
        Self::write_file(&self.annotation_html_path(annopath, version), html).await?;
        let contents = serde_json::to_string(data).map_err(|e| PfscError::Internal(e.to_string()))?;
        Self::write_file(&self.annotation_data_path(annopath, version), &contents).await
    }

    async fn record_repo_manifest(&self, repopath: &str, version: &str, manifest: &Value) -> Result<()> {
        let contents = serde_json::to_string(manifest).map_err(|e| PfscError::Internal(e.to_string()))?;
        Self::write_file(&self.manifest_path(repopath, version), &contents).await
    }

    async fn delete_builds_under_module(&self, modpath: &str, version: &str) -> Result<()> {
        Self::remove_dir(&self.artifact_root.join("module_source").join(modpath)).await?;
        Self::remove_dir(&self.artifact_root.join("dashgraphs").join(modpath)).await?;
        Self::remove_dir(&self.artifact_root.join("annotations").join(modpath)).await?;
        let _ = version;
        Ok(())
    }

    async fn add_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        state.users.insert(user.libpath(), user);
        Ok(())
    }

    async fn update_user(&self, user: User) -> Result<()> {
        self.add_user(user).await
    }

    async fn delete_user(&self, libpath: &str, delete_notes: bool) -> Result<()> {
        let mut state = self.state.write().await;
        state.users.remove(libpath);
        if delete_notes {
            let username = libpath.rsplit('.').next().unwrap_or(libpath).to_string();
            state.notes.retain(|(u, _), _| u != &username);
        }
        Ok(())
    }

    async fn record_user_notes(
        &self,
        username: &str,
        origin: &str,
        state_val: NoteState,
        text: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if text.trim().is_empty() {
            state.notes.remove(&(username.to_string(), origin.to_string()));
        } else {
            state.notes.insert((username.to_string(), origin.to_string()), (state_val, text.to_string()));
        }
        Ok(())
    }

    async fn delete_all_notes_of_one_user(&self, username: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.notes.retain(|(u, _), _| u != username);
        Ok(())
    }

    async fn set_approval(&self, widgetpath: &str, version: &str, approved: bool) -> Result<()> {
        let mut state = self.state.write().await;
        state.approvals.insert((widgetpath.to_string(), version.to_string()), approved);
        Ok(())
    }
}

#[async_trait]
impl GraphReader for MemoryGraphStore {
    async fn get_versions_indexed(&self, repopath: &str, include_wip: bool) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .indexed_versions
            .get(repopath)
            .map(|vs| vs.iter().filter(|v| include_wip || v.as_str() != "WIP").cloned().collect())
            .unwrap_or_default())
    }

    async fn version_is_already_indexed(&self, repopath: &str, version: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.indexed_versions.get(repopath).is_some_and(|vs| vs.iter().any(|v| v == version)))
    }

    async fn get_existing_objects(
        &self,
        modpath: &str,
        major: u32,
        recursive: bool,
    ) -> Result<(Vec<KNode>, Vec<KReln>)> {
        let state = self.state.read().await;
        let matches = |p: &str| -> bool {
            p == modpath || (recursive && p.starts_with(modpath) && p.as_bytes().get(modpath.len()) == Some(&b'.'))
        };
        let nodes: Vec<KNode> = state
            .graph
            .node_weights()
            .filter(|n| matches(&n.modpath) && n.is_live_at(major))
            .cloned()
            .collect();
        let edges: Vec<KReln> = state
            .graph
            .edge_weights()
            .filter(|e| matches(&e.modpath) && e.is_live_at(major))
            .cloned()
            .collect();
        Ok((nodes, edges))
    }

    async fn find_move_conjugate(&self, libpath: &str) -> Result<MoveOutcome> {
        let state = self.state.read().await;
        Ok(pfsc_index::find_move_conjugate(libpath, &state.move_mapping))
    }

    async fn get_origins(&self, libpaths: &[String], major: u32) -> Result<HashMap<String, Option<String>>> {
        let state = self.state.read().await;
        let mut out = HashMap::new();
        for lp in libpaths {
            let origin = state
                .graph
                .node_weights()
                .find(|n| n.uid.libpath == *lp && n.is_live_at(major))
                .and_then(|n| n.origin.clone());
            out.insert(lp.clone(), origin);
        }
        Ok(out)
    }

    async fn load_module_source(&self, modpath: &str, version: &str) -> Result<Option<String>> {
        Self::read_file(&self.module_source_path(modpath, version)).await
    }

    async fn load_dashgraph(&self, deducpath: &str, version: &str) -> Result<Option<Value>> {
        match Self::read_file(&self.dashgraph_path(deducpath, version)).await? {
            Some(s) => Ok(Some(serde_json::from_str(&s).map_err(|e| PfscError::Internal(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn load_annotation(&self, annopath: &str, version: &str) -> Result<Option<(String, Value)>> {
        let html = Self::read_file(&self.annotation_html_path(annopath, version)).await?;
        let data = Self::read_file(&self.annotation_data_path(annopath, version)).await?;
        match (html, data) {
            (Some(h), Some(d)) => {
                let v: Value = serde_json::from_str(&d).map_err(|e| PfscError::Internal(e.to_string()))?;
                Ok(Some((h, v)))
            }
            _ => Ok(None),
        }
    }

    async fn load_repo_manifest(&self, repopath: &str, version: &str) -> Result<Option<Value>> {
        match Self::read_file(&self.manifest_path(repopath, version)).await? {
            Some(s) => Ok(Some(serde_json::from_str(&s).map_err(|e| PfscError::Internal(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn load_user_notes(&self, username: &str, origin: &str) -> Result<Option<(NoteState, String)>> {
        let state = self.state.read().await;
        Ok(state.notes.get(&(username.to_string(), origin.to_string())).cloned())
    }

    async fn is_approved(&self, widgetpath: &str, version: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.approvals.get(&(widgetpath.to_string(), version.to_string())).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_index::{EdgeType, NodeLabel};
    use serde_json::Map;

    fn node(libpath: &str, modpath: &str, major: u32) -> KNode {
        KNode {
            uid: NodeUid::new(libpath, major),
            label: NodeLabel::Deduc,
            modpath: modpath.to_string(),
            repopath: modpath.to_string(),
            origin: Some("src".to_string()),
            cut: None,
            props: Map::new(),
        }
    }

    fn mii(repopath: &str, major: u32) -> ModuleIndexInfo {
        ModuleIndexInfo {
            repopath: repopath.to_string(),
            version: pfsc_path::Version::numbered(major, 0, 0),
            major,
            commit_hash: "abc".to_string(),
            recursive: true,
            change_log: Default::default(),
        }
    }

    #[tokio::test]
    async fn index_then_read_back_live_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        let diff = DiffResult { v_add: vec![node("a.b.Thm", "a.b", 1)], v_cut: vec![], e_add: vec![], e_cut: vec![] };
        store.index_module(&mii("a.b", 1), diff, MoveMapping::new()).await.unwrap();

        let (nodes, _) = store.get_existing_objects("a.b", 1, false).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].uid.libpath, "a.b.Thm");
    }

    #[tokio::test]
    async fn cut_node_is_not_live_at_the_cutting_major() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        let diff = DiffResult { v_add: vec![node("a.b.Thm", "a.b", 1)], v_cut: vec![], e_add: vec![], e_cut: vec![] };
        store.index_module(&mii("a.b", 1), diff, MoveMapping::new()).await.unwrap();

        let cut_diff = DiffResult { v_add: vec![], v_cut: vec![NodeUid::new("a.b.Thm", 1)], e_add: vec![], e_cut: vec![] };
        store.index_module(&mii("a.b", 2), cut_diff, MoveMapping::new()).await.unwrap();

        let (live_at_1, _) = store.get_existing_objects("a.b", 1, false).await.unwrap();
        assert_eq!(live_at_1.len(), 1);
        let (live_at_2, _) = store.get_existing_objects("a.b", 2, false).await.unwrap();
        assert!(live_at_2.is_empty());
    }

    #[tokio::test]
    async fn recursive_lookup_includes_descendant_modpaths() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        let diff = DiffResult { v_add: vec![node("a.b.sub.Thm", "a.b.sub", 1)], v_cut: vec![], e_add: vec![], e_cut: vec![] };
        store.index_module(&mii("a.b", 1), diff, MoveMapping::new()).await.unwrap();

        let (direct, _) = store.get_existing_objects("a.b", 1, false).await.unwrap();
        assert!(direct.is_empty());
        let (recursive, _) = store.get_existing_objects("a.b", 1, true).await.unwrap();
        assert_eq!(recursive.len(), 1);
    }

    #[tokio::test]
    async fn edge_requires_both_endpoints_already_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        let tail = NodeUid::new("a.b.Thm", 1);
        let head = NodeUid::new("a.b.Lemma", 1);
        let edge = KReln {
            uid: EdgeUid { edge_type: EdgeType::Implies, tail, head },
            repopath: "a.b".to_string(),
            modpath: "a.b".to_string(),
            major: 1,
            cut: None,
            props: Map::new(),
        };
        let diff = DiffResult { v_add: vec![], v_cut: vec![], e_add: vec![edge], e_cut: vec![] };
        assert!(store.index_module(&mii("a.b", 1), diff, MoveMapping::new()).await.is_err());
    }

    #[tokio::test]
    async fn records_and_loads_module_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        store.record_module_source("a.b", "v1.0.0", "deduc Thm { }").await.unwrap();
        let loaded = store.load_module_source("a.b", "v1.0.0").await.unwrap();
        assert_eq!(loaded.as_deref(), Some("deduc Thm { }"));
    }

    #[tokio::test]
    async fn missing_dashgraph_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        assert!(store.load_dashgraph("a.b.Thm", "v1.0.0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_notes_delete_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        store.record_user_notes("alice", "a.b.Thm", NoteState::Checked, "remember this").await.unwrap();
        assert!(store.load_user_notes("alice", "a.b.Thm").await.unwrap().is_some());
        store.record_user_notes("alice", "a.b.Thm", NoteState::Checked, "   ").await.unwrap();
        assert!(store.load_user_notes("alice", "a.b.Thm").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn move_mapping_accumulates_across_index_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryGraphStore::new(dir.path());
        let mut moves = MoveMapping::new();
        moves.insert("a.b.Old".to_string(), Some("a.b.New".to_string()));
        store.index_module(&mii("a.b", 2), DiffResult::default(), moves).await.unwrap();

        let outcome = store.find_move_conjugate("a.b.Old.sub").await.unwrap();
        assert_eq!(outcome, MoveOutcome::MovedTo("a.b.New.sub".to_string()));
    }
}
