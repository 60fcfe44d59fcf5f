//! The index entity schema (kNode/kReln/User) and the algorithms that
//! drive a module's write path: the ISOLATED/DIFFERENTIAL diff, move
//! resolution, and release guards (spec §4.7, §3.10/§3.11).

mod diff;
mod moves;
mod release;
mod types;

pub use diff::{diff_differential, diff_isolated, ChangeLog, DiffResult, ModuleIndexInfo};
pub use moves::{build_mm_closure, find_move_conjugate, MoveMapping, MoveOutcome};
pub use release::check_release_guards;
pub use types::{EdgeType, EdgeUid, KNode, KReln, NodeLabel, NodeUid, NoteState, NotesStoragePref, User};
