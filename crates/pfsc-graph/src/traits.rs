//! The write and read contracts a graph backend must satisfy (spec §4.8,
//! §4.9). Grounded on `dashflow-neo4j::GraphStore`'s shape: an
//! `#[async_trait] pub trait ...: Send + Sync` returning a crate-local
//! `Result<T>`, so a backend can be swapped (in-memory, Neo4j) behind a
//! trait object without the rest of the system knowing which one it got.
//!
//! Both traits are scoped to the operations the rest of this workspace
//! actually drives end-to-end: indexing a module's diff, recording and
//! reading back the artifacts a build produces, and the account/notes
//! bookkeeping spec §3.11 describes. Narrower lookups named in spec §4.9
//! (ancestor chains, deductive neighborhoods, enrichment search) are left
//! to be composed by callers on top of `get_existing_objects`, which
//! returns every live kNode/kReln under a module — the same information
//! those narrower queries would otherwise duplicate trait surface to get at.

use async_trait::async_trait;
use pfsc_errors::Result;
use pfsc_index::{KNode, KReln, ModuleIndexInfo, MoveMapping, MoveOutcome, NoteState, User};
use serde_json::Value;
use std::collections::HashMap;

/// The write path: everything a build's index/record phase needs to commit.
#[async_trait]
pub trait GraphWriter: Send + Sync {
    /// Applies a module's diff (`v_add`/`v_cut`/`e_add`/`e_cut`) and records
    /// `moves` so future `find_move_conjugate` lookups can see them.
    async fn index_module(
        &self,
        mii: &ModuleIndexInfo,
        diff: pfsc_index::DiffResult,
        moves: MoveMapping,
    ) -> Result<()>;

    async fn record_module_source(&self, modpath: &str, version: &str, modtext: &str) -> Result<()>;

    async fn record_dashgraph(&self, deducpath: &str, version: &str, dashgraph: &Value) -> Result<()>;

    async fn record_annobuild(
        &self,
        annopath: &str,
        version: &str,
        html: &str,
        data: &Value,
    ) -> Result<()>;

    async fn record_repo_manifest(&self, repopath: &str, version: &str, manifest: &Value) -> Result<()>;

    /// Removes every build artifact recorded under `modpath`@`version`
    /// (module source, dashgraphs, annotations) without touching the index.
    async fn delete_builds_under_module(&self, modpath: &str, version: &str) -> Result<()>;

    async fn add_user(&self, user: User) -> Result<()>;
    async fn update_user(&self, user: User) -> Result<()>;
    async fn delete_user(&self, libpath: &str, delete_notes: bool) -> Result<()>;

    async fn record_user_notes(
        &self,
        username: &str,
        origin: &str,
        state: NoteState,
        text: &str,
    ) -> Result<()>;

    async fn delete_all_notes_of_one_user(&self, username: &str) -> Result<()>;

    async fn set_approval(&self, widgetpath: &str, version: &str, approved: bool) -> Result<()>;
}

/// The read path: lookups the builder and the notes/annotation layers need.
#[async_trait]
pub trait GraphReader: Send + Sync {
    async fn get_versions_indexed(&self, repopath: &str, include_wip: bool) -> Result<Vec<String>>;

    async fn version_is_already_indexed(&self, repopath: &str, version: &str) -> Result<bool>;

    /// Every live kNode/kReln under `modpath` at `major`; `recursive` widens
    /// the match to every descendant libpath, not just exact matches.
    async fn get_existing_objects(
        &self,
        modpath: &str,
        major: u32,
        recursive: bool,
    ) -> Result<(Vec<KNode>, Vec<KReln>)>;

    async fn find_move_conjugate(&self, libpath: &str) -> Result<MoveOutcome>;

    /// Each requested libpath's recorded `origin`, or `None` if it has no
    /// live kNode.
    async fn get_origins(&self, libpaths: &[String], major: u32) -> Result<HashMap<String, Option<String>>>;

    async fn load_module_source(&self, modpath: &str, version: &str) -> Result<Option<String>>;

    async fn load_dashgraph(&self, deducpath: &str, version: &str) -> Result<Option<Value>>;

    async fn load_annotation(&self, annopath: &str, version: &str) -> Result<Option<(String, Value)>>;

    async fn load_repo_manifest(&self, repopath: &str, version: &str) -> Result<Option<Value>>;

    async fn load_user_notes(&self, username: &str, origin: &str) -> Result<Option<(NoteState, String)>>;

    async fn is_approved(&self, widgetpath: &str, version: &str) -> Result<bool>;
}
