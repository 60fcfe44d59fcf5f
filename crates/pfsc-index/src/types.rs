//! Index entity schema: labelled vertices (kNode) and labelled, typed edges
//! (kReln), plus the minimal `User` shape they attach to (spec §3.10/§3.11).
//!
//! Grounded on `code-indexer/src/types.rs`'s enum style: `snake_case` serde
//! enums carrying no payload of their own, with type-specific data kept in a
//! side map (`props` here, `extras`/`tags` there) rather than as enum
//! variant fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Deduc,
    Node,
    Ghost,
    Special,
    Anno,
    Widget,
    Defn,
    Asgn,
    Module,
    Version,
    User,
    Void,
    ModSrc,
    DeducBuild,
    AnnoBuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Under,
    Expands,
    Implies,
    Targets,
    Retargets,
    Move,
    GhostOf,
    Cf,
    Build,
    Notes,
}

/// A kNode's identity: libpath plus the major version at which it first
/// came into being. Distinct nodes can share a libpath across majors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeUid {
    pub libpath: String,
    pub major: u32,
}

impl NodeUid {
    pub fn new(libpath: impl Into<String>, major: u32) -> Self {
        NodeUid { libpath: libpath.into(), major }
    }
}

impl fmt::Display for NodeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.libpath, self.major)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNode {
    pub uid: NodeUid,
    pub label: NodeLabel,
    pub modpath: String,
    pub repopath: String,
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<u32>,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl KNode {
    /// True while this node is live at `major` (added at or before it, and
    /// either never cut, or cut strictly after it).
    pub fn is_live_at(&self, major: u32) -> bool {
        self.uid.major <= major && self.cut.map_or(true, |cut| cut > major)
    }
}

/// A kReln's identity: its edge type plus the uids of its two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeUid {
    pub edge_type: EdgeType,
    pub tail: NodeUid,
    pub head: NodeUid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KReln {
    pub uid: EdgeUid,
    pub repopath: String,
    pub modpath: String,
    pub major: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<u32>,
    /// Type-specific properties: `segment` for `Under`, `ep_taken_at` for
    /// `Expands`, etc.
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl KReln {
    pub fn is_live_at(&self, major: u32) -> bool {
        self.major <= major && self.cut.map_or(true, |cut| cut > major)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotesStoragePref {
    Local,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteState {
    Checked,
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub host: String,
    pub username: String,
    pub user_type: String,
    pub email: Option<String>,
    pub created_at: String,
    pub notes_storage_pref: NotesStoragePref,
    pub owned_orgs: Vec<String>,
}

impl User {
    /// The `(host.username)` identity used as this user's kNode libpath.
    pub fn libpath(&self) -> String {
        format!("{}.{}", self.host, self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_uid_displays_libpath_at_major() {
        assert_eq!(NodeUid::new("a.b.Thm", 2).to_string(), "a.b.Thm@2");
    }

    #[test]
    fn node_is_live_only_within_its_major_cut_interval() {
        let node = KNode {
            uid: NodeUid::new("a.b.Thm", 1),
            label: NodeLabel::Deduc,
            modpath: "a.b".to_string(),
            repopath: "a.b".to_string(),
            origin: None,
            cut: Some(3),
            props: Map::new(),
        };
        assert!(!node.is_live_at(0));
        assert!(node.is_live_at(1));
        assert!(node.is_live_at(2));
        assert!(!node.is_live_at(3));
    }

    #[test]
    fn user_libpath_joins_host_and_username() {
        let user = User {
            host: "github".to_string(),
            username: "alice".to_string(),
            user_type: "standard".to_string(),
            email: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            notes_storage_pref: NotesStoragePref::Graph,
            owned_orgs: vec![],
        };
        assert_eq!(user.libpath(), "github.alice");
    }
}
