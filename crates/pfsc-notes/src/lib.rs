//! Origin-keyed user notes (spec §3.11/§4.12): a `NOTES` edge from a user to
//! an *origin* (`libpath@major`), not to a versioned libpath, so that when
//! an entity moves across releases notes taken on its earlier incarnation
//! stay attached to it. Recording blank text deletes the edge.
//!
//! Grounded on `rag-store/src/lib.rs`'s facade shape: a thin struct wrapping
//! a backing client (there, `QdrantFacade`; here, `pfsc-graph`'s
//! `GraphWriter`/`GraphReader` traits) with async methods that log via
//! `tracing` and delegate straight through. `pfsc-notes` depends only on
//! `pfsc-graph`'s traits, never a concrete binding, so it works the same way
//! against the filesystem store and the Neo4j one.

use pfsc_errors::{PfscError, Result};
use pfsc_graph::{GraphReader, GraphWriter};
use pfsc_index::NoteState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Facade over the notes slice of the `GraphWriter`/`GraphReader` contract.
/// `NotesService` is the single entry point application code should use for
/// recording, loading, and bulk-managing a user's notes.
pub struct NotesService {
    writer: Arc<dyn GraphWriter>,
    reader: Arc<dyn GraphReader>,
}

impl NotesService {
    pub fn new(writer: Arc<dyn GraphWriter>, reader: Arc<dyn GraphReader>) -> Self {
        NotesService { writer, reader }
    }

    async fn origin_of(&self, goal_libpath: &str, major: u32) -> Result<String> {
        let origins = self.reader.get_origins(&[goal_libpath.to_string()], major).await?;
        origins
            .get(goal_libpath)
            .cloned()
            .flatten()
            .ok_or_else(|| PfscError::ModuleDoesNotContainObject(goal_libpath.to_string(), "goal".to_string()))
    }

    /// Records `(state, text)` against `goal_libpath`'s origin at `major`.
    /// A blank `text` deletes the `NOTES` edge (the backend's contract, not
    /// this facade's: `record_user_notes` carries that rule through to
    /// storage).
    pub async fn record_notes(&self, username: &str, goal_libpath: &str, major: u32, state: NoteState, text: &str) -> Result<()> {
        let origin = self.origin_of(goal_libpath, major).await?;
        debug!(username, origin = %origin, blank = text.is_empty(), "recording user notes");
        self.writer.record_user_notes(username, &origin, state, text).await
    }

    /// Loads the notes recorded against `goal_libpath`'s origin at `major`,
    /// resolving through moves: a later release's entity is looked up by its
    /// own origin, the same one notes on its earlier incarnation used.
    pub async fn load_notes(&self, username: &str, goal_libpath: &str, major: u32) -> Result<Option<(NoteState, String)>> {
        let origin = self.origin_of(goal_libpath, major).await?;
        self.reader.load_user_notes(username, &origin).await
    }

    /// Loads notes for every `(goal_libpath, major)` pair in one batch,
    /// keyed by the requested libpath. Entries with no live kNode or no
    /// recorded notes are simply absent from the result.
    pub async fn load_all(&self, username: &str, goals: &[(String, u32)]) -> Result<HashMap<String, (NoteState, String)>> {
        let mut out = HashMap::new();
        for (goal_libpath, major) in goals {
            if let Ok(origin) = self.origin_of(goal_libpath, *major).await {
                if let Some(entry) = self.reader.load_user_notes(username, &origin).await? {
                    out.insert(goal_libpath.clone(), entry);
                }
            }
        }
        Ok(out)
    }

    /// Machine-readable export of every note in `load_all`'s result, keyed by
    /// origin rather than the requested libpath (the stable identity notes
    /// are actually attached to).
    pub async fn export_all(&self, username: &str, goals: &[(String, u32)]) -> Result<HashMap<String, (NoteState, String)>> {
        let mut out = HashMap::new();
        for (goal_libpath, major) in goals {
            let origin = match self.origin_of(goal_libpath, *major).await {
                Ok(o) => o,
                Err(_) => continue,
            };
            if let Some(entry) = self.reader.load_user_notes(username, &origin).await? {
                out.insert(origin, entry);
            }
        }
        Ok(out)
    }

    /// Deletes every note this user has ever recorded, across every origin.
    pub async fn delete_all(&self, username: &str) -> Result<()> {
        info!(username, "deleting all notes for user");
        self.writer.delete_all_notes_of_one_user(username).await
    }
}
