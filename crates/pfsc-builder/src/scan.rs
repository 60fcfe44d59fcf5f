//! Turns a parsed module into its kNode/kReln contributions and, for
//! deductions and annotations, the documents `pfsc-dashgraph` builds (spec
//! §4.10 step 4, "scan_pfsc_module").

use pfsc_dashgraph::{build_annotation, build_dashgraph, DeducMeta, NodeKind, NodeMeta};
use pfsc_errors::Result;
use pfsc_index::{EdgeType, EdgeUid, KNode, KReln, NodeLabel, NodeUid};
use pfsc_meson::{build_graph_from_meson, find_and_mark_bridges, mark_flow_link_outs_as_bridges, NodeSemantics};
use pfsc_parser::{Item, ModuleTree};
use pfsc_resolver::{mirror_ancestor_chain, AncestorLink, GhostNode};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A deduction body's internal node scoping isn't fully represented in
/// `ModuleTree` (the Meson sublanguage owns modality/subdeduc nesting, and
/// binds those independently through `pfsc-resolver` once cross-module name
/// resolution is available). What this scan *can* determine without that
/// later pass is ghosting: a node whose bare name matches one of the
/// deduction's own `of` targets names an entity declared outside the
/// deduction (spec §3.7), so it is scanned as a ghost mirroring that
/// target's libpath via [`pfsc_resolver::mirror_ancestor_chain`]. Everything
/// else is reported plain, non-modal, non-subdeduc; those richer attributes
/// are populated once `pfsc-meson::semantic_check` binds real entities to
/// the remaining dummy names, a step this scan doesn't attempt to
/// reproduce here.
struct TargetGhostSemantics<'a> {
    /// Bare final segment of each `of` target, mapped to its full libpath.
    targets_by_name: &'a HashMap<String, String>,
}

impl<'a> NodeSemantics for TargetGhostSemantics<'a> {
    fn is_modal(&self, _name: &str) -> bool {
        false
    }
    fn is_subdeduc(&self, _name: &str) -> bool {
        false
    }
    fn ghost_of(&self, name: &str) -> Option<String> {
        self.targets_by_name.get(name).cloned()
    }
    fn libpath(&self, name: &str) -> String {
        name.to_string()
    }
    fn declared_locally(&self, name: &str) -> bool {
        !self.targets_by_name.contains_key(name)
    }
    fn parent(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Maps each target's bare final segment (the name a Meson/arc-listing
/// script would use to refer to it) to its full libpath.
fn targets_by_bare_name(targets: &[String]) -> HashMap<String, String> {
    targets
        .iter()
        .map(|t| {
            let bare = t.rsplit('.').next().unwrap_or(t.as_str()).to_string();
            (bare, t.clone())
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ScannedModule {
    pub nodes: Vec<KNode>,
    pub edges: Vec<KReln>,
    /// `(deducpath, dashgraph document)`.
    pub dashgraphs: Vec<(String, Value)>,
    /// `(annopath, html, data)`.
    pub annotations: Vec<(String, String, Value)>,
}

fn under_edge(repopath: &str, modpath: &str, major: u32, child: &NodeUid, parent: &NodeUid, segment: &str) -> KReln {
    let mut props = Map::new();
    props.insert("segment".to_string(), Value::String(segment.to_string()));
    KReln {
        uid: EdgeUid { edge_type: EdgeType::Under, tail: child.clone(), head: parent.clone() },
        repopath: repopath.to_string(),
        modpath: modpath.to_string(),
        major,
        cut: None,
        props,
    }
}

fn bare_node(uid: NodeUid, label: NodeLabel, modpath: &str, repopath: &str, props: Map<String, Value>) -> KNode {
    KNode { uid, label, modpath: modpath.to_string(), repopath: repopath.to_string(), origin: None, cut: None, props }
}

/// Scans a single parsed module into its write-path contributions. `major`
/// is the build's target major version (0 for WIP).
pub fn scan_module(repopath: &str, modpath: &str, version: &str, major: u32, tree: &ModuleTree) -> Result<ScannedModule> {
    let module_uid = NodeUid::new(modpath, major);
    let mut scanned = ScannedModule::default();
    scanned.nodes.push(bare_node(module_uid.clone(), NodeLabel::Module, modpath, repopath, Map::new()));

    for item in &tree.items {
        match item {
            Item::Import(_) => {}

            // Read directly out of the root module's tree by `orchestrate`
            // before `check_release_guards` runs; scanning contributes no
            // graph nodes for it.
            Item::ChangeLog(_) => {}

            Item::Assignment(a) => {
                let libpath = format!("{modpath}.{}", a.name);
                let uid = NodeUid::new(libpath.as_str(), major);
                scanned.nodes.push(bare_node(uid.clone(), NodeLabel::Asgn, modpath, repopath, Map::new()));
                scanned.edges.push(under_edge(repopath, modpath, major, &uid, &module_uid, &a.name));
            }

            Item::Defn(d) => {
                let libpath = format!("{modpath}.{}", d.name);
                let uid = NodeUid::new(libpath.as_str(), major);
                let mut props = Map::new();
                props.insert("definiendum".to_string(), Value::String(d.definiendum.clone()));
                props.insert("definiens".to_string(), Value::String(d.definiens.clone()));
                scanned.nodes.push(bare_node(uid.clone(), NodeLabel::Defn, modpath, repopath, props));
                scanned.edges.push(under_edge(repopath, modpath, major, &uid, &module_uid, &d.name));
            }

            Item::Deduc(d) => {
                let libpath = format!("{modpath}.{}", d.name);
                let uid = NodeUid::new(libpath.as_str(), major);
                scanned.nodes.push(bare_node(uid.clone(), NodeLabel::Deduc, modpath, repopath, Map::new()));
                scanned.edges.push(under_edge(repopath, modpath, major, &uid, &module_uid, &d.name));

                let targets_by_name = targets_by_bare_name(&d.of_targets);
                let sem = TargetGhostSemantics { targets_by_name: &targets_by_name };
                let mut graph = build_graph_from_meson(&d.body)?;
                mark_flow_link_outs_as_bridges(&mut graph);
                find_and_mark_bridges(&mut graph, &sem);

                // Ghosts minted while scanning this deduction's nodes, keyed
                // by real libpath, so a target referenced more than once
                // inside the same deduction reuses a single ghost (§3.7).
                let mut ghosts: HashMap<String, GhostNode> = HashMap::new();
                let node_meta: HashMap<String, NodeMeta> = graph
                    .nodes()
                    .iter()
                    .map(|n| {
                        let meta = match sem.ghost_of(&n.name) {
                            Some(real_libpath) => {
                                let chain = [AncestorLink { segment: n.name.clone(), real_libpath: real_libpath.clone() }];
                                let ghost = mirror_ancestor_chain(&libpath, &chain, &mut ghosts)
                                    .into_iter()
                                    .next()
                                    .expect("single-link chain yields exactly one ghost");
                                NodeMeta {
                                    label_html: n.name.clone(),
                                    nodetype: "ghost".to_string(),
                                    intra_deduc_path: ghost.ghost_libpath.clone(),
                                    kind: NodeKind::Ghost {
                                        ghost_of: real_libpath.clone(),
                                        real_obj: real_libpath,
                                        real_origin: None,
                                        fwd_rel_path: n.name.clone(),
                                        xpan_seq: Some(0),
                                    },
                                    ..Default::default()
                                }
                            }
                            None => NodeMeta {
                                label_html: n.name.clone(),
                                nodetype: "node".to_string(),
                                kind: NodeKind::Plain,
                                ..Default::default()
                            },
                        };
                        (n.name.clone(), meta)
                    })
                    .collect();

                let meta = DeducMeta {
                    libpath: libpath.clone(),
                    version: version.to_string(),
                    deduction: d.name.clone(),
                    targets: d.of_targets.clone(),
                    ..Default::default()
                };
                let dashgraph = build_dashgraph(&meta, &graph, &node_meta, &HashMap::new());
                scanned.dashgraphs.push((libpath, dashgraph));
            }

            Item::Anno(a) => {
                let libpath = format!("{modpath}.{}", a.name);
                let uid = NodeUid::new(libpath.as_str(), major);
                scanned.nodes.push(bare_node(uid.clone(), NodeLabel::Anno, modpath, repopath, Map::new()));
                scanned.edges.push(under_edge(repopath, modpath, major, &uid, &module_uid, &a.name));

                let (html, data) = build_annotation(&libpath, version, &a.raw, None, |stub| {
                    format!("<span data-uid=\"{}\">{}</span>", stub.uid, stub.label)
                })?;
                scanned.annotations.push((libpath, html, data));
            }
        }
    }

    Ok(scanned)
}
