//! The `Builder`: runs a `BuildRequest` through the seven phases spec §4.10
//! names — checkout, root-declaration check, reading, resolving, index
//! write, artifact write, manifest merge — publishing a `MonitorEvent` at
//! each boundary and honoring cooperative cancellation in between.
//!
//! Grounded on `mr-reviewer/src/review/context/build.rs`'s phase-sequenced
//! assembly (each phase consumes the previous one's output and nothing
//! else); concurrency is `services::git::clone_list`'s bounded-concurrency
//! idea turned inside out — that function bounds *how many* clones run at
//! once, this bounds builds to *one at a time per repo-version key*, via a
//! `tokio::sync::Mutex` looked up (and lazily created) per key.

use crate::cache::ModuleCache;
use crate::monitor::BuildMonitor;
use crate::request::BuildRequest;
use crate::scan::scan_module;
use pfsc_errors::{PfscError, Result};
use pfsc_graph::{GraphReader, GraphWriter};
use pfsc_index::{
    check_release_guards, diff_differential, diff_isolated, ChangeLog, ModuleIndexInfo, MoveMapping,
};
use pfsc_manifest::{Manifest, ManifestTreeNode};
use pfsc_path::{Libpath, MajorVersion, Version};
use pfsc_repo::{discover_modules, Checkout, DiscoveredModule, DIRECTORY_MODULE_FILE};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

fn cancelled() -> PfscError {
    PfscError::Internal("build cancelled".to_string())
}

/// Pulls the repo root module's `excepts { moved, deletions }` block (spec
/// §4.7) out of its parsed tree, if it declares one. A root module may
/// declare at most one such block; a second is ignored rather than merged.
fn change_log_from_root(root_src: &str) -> Result<ChangeLog> {
    let tree = pfsc_parser::parse_module(root_src)?;
    for item in &tree.items {
        if let pfsc_parser::Item::ChangeLog(decl) = item {
            return Ok(ChangeLog { moved: decl.moved.clone(), deletions: decl.deletions.clone() });
        }
    }
    Ok(ChangeLog::default())
}

/// Translates a discovered module's path on disk back into its dotted
/// modpath, relative to `repopath` (spec §6.1: directory segments map onto
/// libpath segments one-for-one; a directory module's own name comes from
/// its parent directory, since `__.pfsc` itself contributes no segment).
fn modpath_for(dest: &Path, repopath: &str, module: &DiscoveredModule) -> Result<String> {
    let target = if module.is_directory_module {
        module.path.parent().ok_or_else(|| PfscError::Internal("module file has no parent".to_string()))?.to_path_buf()
    } else {
        module.path.with_extension("")
    };
    let rel = target
        .strip_prefix(dest)
        .map_err(|e| PfscError::Internal(e.to_string()))?;
    let segs: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if segs.is_empty() {
        Ok(repopath.to_string())
    } else {
        Ok(format!("{repopath}.{}", segs.join(".")))
    }
}

/// Builds the manifest subtree this build's modules and their deductions /
/// annotations belong under. Modules nest under the closest other module in
/// `trees` that is a libpath ancestor of theirs, defaulting to `root_modpath`
/// when none is.
fn build_manifest_tree(
    root_modpath: &str,
    version: &str,
    commit: &str,
    now: &str,
    trees: &HashMap<String, (pfsc_parser::ModuleTree, String)>,
    dashgraphs: &[(String, Value)],
    annotations: &[(String, String, Value)],
) -> Manifest {
    let mut nodes: HashMap<String, ManifestTreeNode> = HashMap::new();
    for modpath in trees.keys() {
        let mut node = ManifestTreeNode::new(modpath.clone(), Map::new());
        node.set_data_property("type", Value::String("MODULE".to_string()));
        nodes.insert(modpath.clone(), node);
    }
    if !nodes.contains_key(root_modpath) {
        let mut root = ManifestTreeNode::new(root_modpath.to_string(), Map::new());
        root.set_data_property("type", Value::String("MODULE".to_string()));
        nodes.insert(root_modpath.to_string(), root);
    }

    for (deducpath, dashgraph) in dashgraphs {
        let parent = deducpath.rsplit_once('.').map(|(p, _)| p).unwrap_or(root_modpath);
        if let Some(parent_node) = nodes.get_mut(parent) {
            let mut child = ManifestTreeNode::new(deducpath.clone(), Map::new());
            child.set_data_property("type", Value::String("DEDUC".to_string()));
            child.set_data_property("dashgraph", dashgraph.clone());
            parent_node.add_child(child);
        }
    }
    for (annopath, html, data) in annotations {
        let parent = annopath.rsplit_once('.').map(|(p, _)| p).unwrap_or(root_modpath);
        if let Some(parent_node) = nodes.get_mut(parent) {
            let mut child = ManifestTreeNode::new(annopath.clone(), Map::new());
            child.set_data_property("type", Value::String("ANNO".to_string()));
            child.set_data_property("html", Value::String(html.clone()));
            child.set_data_property("widget_data", data.clone());
            parent_node.add_child(child);
        }
    }

    let mut modpaths: Vec<String> = nodes.keys().filter(|m| m.as_str() != root_modpath).cloned().collect();
    modpaths.sort_by_key(|m| m.len());
    for modpath in modpaths {
        let parent = modpaths_parent(&modpath, root_modpath, &nodes);
        if let Some(child) = nodes.remove(&modpath) {
            if let Some(parent_node) = nodes.get_mut(&parent) {
                parent_node.add_child(child);
            } else {
                nodes.insert(modpath, child);
            }
        }
    }

    let root = nodes.remove(root_modpath).unwrap_or_else(|| ManifestTreeNode::new(root_modpath.to_string(), Map::new()));
    let mut manifest = Manifest::new(root);
    manifest.set_build_info(root_modpath, version, commit, now);
    manifest
}

fn modpaths_parent(modpath: &str, root_modpath: &str, nodes: &HashMap<String, ManifestTreeNode>) -> String {
    let segs: Vec<&str> = modpath.split('.').collect();
    for n in (1..segs.len()).rev() {
        let prefix = segs[..n].join(".");
        if prefix == modpath {
            continue;
        }
        if nodes.contains_key(&prefix) {
            return prefix;
        }
    }
    root_modpath.to_string()
}

pub struct Builder {
    checkout: Arc<dyn Checkout>,
    writer: Arc<dyn GraphWriter>,
    reader: Arc<dyn GraphReader>,
    monitor: Arc<BuildMonitor>,
    workdir: PathBuf,
    cache_dir: PathBuf,
    skip_list: Vec<String>,
    repo_locks: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Builder {
    pub fn new(
        checkout: Arc<dyn Checkout>,
        writer: Arc<dyn GraphWriter>,
        reader: Arc<dyn GraphReader>,
        monitor: Arc<BuildMonitor>,
        workdir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Builder {
            checkout,
            writer,
            reader,
            monitor,
            workdir: workdir.into(),
            cache_dir: cache_dir.into(),
            skip_list: vec![".git".to_string()],
            repo_locks: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, repopath: &str, version: &str) -> Arc<AsyncMutex<()>> {
        let key = format!("{repopath}@{version}");
        let mut locks = self.repo_locks.lock().await;
        locks.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    #[instrument(skip(self, req, cancel), fields(modpath = %req.modpath, version = %req.version))]
    pub async fn build(&self, req: BuildRequest, cancel: CancellationToken) -> Result<Manifest> {
        let modpath_lp = Libpath::parse(&req.modpath)?;
        let repopath = modpath_lp.repo_root()?.as_str().to_string();
        let version_str = req.version.to_string();
        let lock = self.lock_for(&repopath, &version_str).await;
        let _permit = lock.lock().await;

        // Phase 1: checkout.
        self.monitor.publish("checkout", 1, 7, format!("checking out {repopath}@{version_str}"));
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let dest = self.workdir.join(repopath.replace('.', "_")).join(&version_str);
        let rev = if req.version.is_wip() { "HEAD".to_string() } else { version_str.clone() };
        self.checkout.checkout(&rev, &dest).await?;
        let commit_hash = self.checkout.resolve(&rev).await?;

        // Phase 2: check root declarations.
        self.monitor.publish("check_root", 2, 7, "checking root declarations");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let already_indexed = self.reader.version_is_already_indexed(&repopath, &version_str).await?;
        let prior_versions = self.reader.get_versions_indexed(&repopath, false).await?;
        let prev_major = prior_versions
            .iter()
            .filter_map(|v| v.parse::<Version>().ok())
            .filter_map(|v| match v {
                Version::Numbered { major, .. } => Some(major),
                Version::Wip => None,
            })
            .max()
            .unwrap_or(0);
        let major_num = match req.version.major() {
            MajorVersion::Major(m) => m,
            MajorVersion::Wip => 0,
        };

        let change_log = match tokio::fs::read_to_string(dest.join(DIRECTORY_MODULE_FILE)).await {
            Ok(root_src) => change_log_from_root(&root_src)?,
            Err(_) => ChangeLog::default(),
        };
        let wip_dependencies: Vec<String> = req
            .dependencies
            .iter()
            .filter(|(_, v)| **v == Version::Wip)
            .map(|(repopath, _)| repopath.clone())
            .collect();

        let mii = ModuleIndexInfo {
            repopath: repopath.clone(),
            version: req.version,
            major: major_num,
            commit_hash: commit_hash.clone(),
            recursive: req.recursive,
            change_log,
        };
        check_release_guards(&mii, already_indexed, prev_major, &wip_dependencies, req.stored_commit_hash.as_deref())?;

        // Phase 3: reading.
        self.monitor.publish("read", 3, 7, "reading module files");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let mut cache = ModuleCache::new();
        if req.caching {
            cache.load(&self.cache_dir, &repopath, &version_str)?;
        }
        let discovered = discover_modules(&dest, &self.skip_list)?;
        let mut trees: HashMap<String, (pfsc_parser::ModuleTree, String)> = HashMap::new();
        for module in &discovered {
            let modpath = modpath_for(&dest, &repopath, module)?;
            let key = ModuleCache::key(&repopath, &version_str, &modpath);
            let src = tokio::fs::read_to_string(&module.path)
                .await
                .map_err(|e| PfscError::Internal(e.to_string()))?;
            let tree = match cache.get(&key) {
                Some(tree) => tree,
                None => {
                    let tree = pfsc_parser::parse_module(&src)?;
                    cache.put(key, tree.clone());
                    tree
                }
            };
            trees.insert(modpath, (tree, src));
        }
        if req.caching {
            cache.persist(&self.cache_dir, &repopath, &version_str)?;
        }

        // Phase 4: resolving.
        self.monitor.publish("resolve", 4, 7, "resolving imports and scanning modules");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let module_trees: HashMap<String, pfsc_parser::ModuleTree> =
            trees.iter().map(|(k, (t, _))| (k.clone(), t.clone())).collect();
        pfsc_resolver::check_no_cyclic_imports(&module_trees)?;

        let mut all_nodes = Vec::new();
        let mut all_edges = Vec::new();
        let mut dashgraphs = Vec::new();
        let mut annotations = Vec::new();
        for (modpath, (tree, _)) in &trees {
            let scanned = scan_module(&repopath, modpath, &version_str, major_num, tree)?;
            all_nodes.extend(scanned.nodes);
            all_edges.extend(scanned.edges);
            dashgraphs.extend(scanned.dashgraphs);
            annotations.extend(scanned.annotations);
        }

        // Phase 5: index write.
        self.monitor.publish("index", 5, 7, "writing index diff");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let diff = if mii.is_wip() {
            diff_isolated(all_nodes, all_edges)
        } else {
            let (old_nodes_vec, old_edges_vec) = self.reader.get_existing_objects(&repopath, prev_major, true).await?;
            let old_nodes: HashMap<_, _> = old_nodes_vec.into_iter().map(|n| (n.uid.clone(), n)).collect();
            let old_edges: HashMap<_, _> = old_edges_vec.into_iter().map(|e| (e.uid.clone(), e)).collect();
            diff_differential(&old_nodes, &all_nodes, &old_edges, &all_edges)
        };
        let mut moves: MoveMapping = HashMap::new();
        for (src, dst) in &mii.change_log.moved {
            moves.insert(src.clone(), Some(dst.clone()));
        }
        for src in &mii.change_log.deletions {
            moves.insert(src.clone(), None);
        }
        self.writer.index_module(&mii, diff, moves).await?;

        // Phase 6: artifact write.
        self.monitor.publish("artifacts", 6, 7, "writing build artifacts");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        self.writer.delete_builds_under_module(&req.modpath, &version_str).await?;
        for (modpath, (_, src)) in &trees {
            self.writer.record_module_source(modpath, &version_str, src).await?;
        }
        for (deducpath, dashgraph) in &dashgraphs {
            self.writer.record_dashgraph(deducpath, &version_str, dashgraph).await?;
        }
        for (annopath, html, data) in &annotations {
            self.writer.record_annobuild(annopath, &version_str, html, data).await?;
        }

        // Phase 7: manifest merge.
        self.monitor.publish("manifest_merge", 7, 7, "merging manifest");
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let now = chrono::Utc::now().to_rfc3339();
        let new_manifest = build_manifest_tree(&req.modpath, &version_str, &commit_hash, &now, &trees, &dashgraphs, &annotations);

        let final_manifest = if req.recursive {
            new_manifest
        } else {
            match self.reader.load_repo_manifest(&repopath, &version_str).await? {
                Some(Value::Object(existing_map)) => {
                    let mut existing_manifest = Manifest::from_dict(existing_map)?;
                    existing_manifest.merge(new_manifest)?;
                    existing_manifest
                }
                Some(_) => return Err(PfscError::ManifestBadForm("existing manifest is not an object".to_string())),
                None => new_manifest,
            }
        };
        self.writer.record_repo_manifest(&repopath, &version_str, &final_manifest.to_dict()).await?;

        info!("build complete");
        Ok(final_manifest)
    }
}
