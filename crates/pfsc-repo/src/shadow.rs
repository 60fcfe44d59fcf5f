//! Shadow version control (spec §3.11/§4.11): an append-only commit history
//! parallel to the author's own git tree, used to record WIP edits made
//! through the pfISE editor rather than the command line.
//!
//! Content hashing (`sha2`) is grounded on `codegraph-prep/src/core/ids.rs`'s
//! `hash_content` helper; the 3-way merge is grounded on the `similar`
//! crate's line-level diff as the pack's natural counterpart to `gix`'s
//! clone/checkout plumbing for diff-and-patch work.

use pfsc_errors::{PfscError, Result};
use sha2::{Digest, Sha256};
use similar::{capture_diff_slices, Algorithm, DiffOp};
use std::collections::BTreeMap;

fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Content-addressed blob store: identical content is stored once,
/// regardless of how many shadow commits reference it.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: std::collections::HashMap<String, Vec<u8>>,
}

impl BlobStore {
    pub fn new() -> Self {
        BlobStore::default()
    }

    /// Stores `content`, returning its hash. A no-op if the content is
    /// already present.
    pub fn put(&mut self, content: &[u8]) -> String {
        let hash = hash_hex(content);
        self.blobs.entry(hash.clone()).or_insert_with(|| content.to_vec());
        hash
    }

    pub fn get(&self, hash: &str) -> Option<&[u8]> {
        self.blobs.get(hash).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowCommit {
    pub id: String,
    pub parent: Option<String>,
    pub message: String,
    /// Path within the repo to the blob hash holding its content at this commit.
    pub tree: BTreeMap<String, String>,
}

/// Append-only shadow commit history. Never rewrites or removes a commit
/// once recorded — only `commit` adds to it.
#[derive(Debug, Default)]
pub struct ShadowHistory {
    commits: Vec<ShadowCommit>,
}

impl ShadowHistory {
    pub fn new() -> Self {
        ShadowHistory::default()
    }

    pub fn head(&self) -> Option<&ShadowCommit> {
        self.commits.last()
    }

    pub fn get(&self, id: &str) -> Option<&ShadowCommit> {
        self.commits.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Diffs `files` against the head commit's tree (by content hash, not
    /// by path-level diff) and records a new commit. A no-op — returns the
    /// existing head's id without appending — if the resulting tree is
    /// identical to the head's.
    pub fn commit(&mut self, blobs: &mut BlobStore, message: &str, files: &BTreeMap<String, Vec<u8>>) -> String {
        let mut tree = BTreeMap::new();
        for (path, content) in files {
            tree.insert(path.clone(), blobs.put(content));
        }
        if let Some(head) = self.head() {
            if head.tree == tree {
                return head.id.clone();
            }
        }
        let parent = self.head().map(|c| c.id.clone());
        let mut hasher_input = Vec::new();
        for (path, hash) in &tree {
            hasher_input.extend_from_slice(path.as_bytes());
            hasher_input.extend_from_slice(hash.as_bytes());
        }
        if let Some(p) = &parent {
            hasher_input.extend_from_slice(p.as_bytes());
        }
        hasher_input.extend_from_slice(message.as_bytes());
        let id = hash_hex(&hasher_input);
        self.commits.push(ShadowCommit { id: id.clone(), parent, message: message.to_string(), tree });
        id
    }
}

/// A base-range edit that consumes `base_start..base_end` (a delete or a
/// replace; `base_start == base_end` never appears here — pure insertions
/// are tracked separately in `Edits::insertions` since they consume no
/// base line and so can't be located by a base range).
struct Span {
    base_start: usize,
    base_end: usize,
    replacement: Vec<String>,
}

struct Edits {
    insertions: std::collections::HashMap<usize, Vec<String>>,
    spans: Vec<Span>,
}

fn edits_from_ops(ops: &[DiffOp], new_lines: &[&str]) -> Edits {
    let mut insertions = std::collections::HashMap::new();
    let mut spans = Vec::new();
    for op in ops {
        match *op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete { old_index, old_len, .. } => {
                spans.push(Span { base_start: old_index, base_end: old_index + old_len, replacement: Vec::new() });
            }
            DiffOp::Insert { old_index, new_index, new_len } => {
                insertions.insert(
                    old_index,
                    new_lines[new_index..new_index + new_len].iter().map(|s| s.to_string()).collect(),
                );
            }
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                spans.push(Span {
                    base_start: old_index,
                    base_end: old_index + old_len,
                    replacement: new_lines[new_index..new_index + new_len].iter().map(|s| s.to_string()).collect(),
                });
            }
        }
    }
    Edits { insertions, spans }
}

fn merge_insertions_at(
    pos: usize,
    ours: &Edits,
    theirs: &Edits,
    merged: &mut Vec<String>,
) -> Result<()> {
    match (ours.insertions.get(&pos), theirs.insertions.get(&pos)) {
        (Some(a), Some(b)) if a == b => merged.extend(a.iter().cloned()),
        (Some(_), Some(_)) => {
            return Err(PfscError::ShadowMergeConflict(format!("conflicting insertions before base line {pos}")))
        }
        (Some(a), None) => merged.extend(a.iter().cloned()),
        (None, Some(b)) => merged.extend(b.iter().cloned()),
        (None, None) => {}
    }
    Ok(())
}

/// Merges `ours` and `theirs`, both derived from `base`, line by line.
/// Returns the merged text, or a `ShadowMergeConflict` naming the first
/// base line range both sides changed differently.
pub fn merge_three_way(base: &str, ours: &str, theirs: &str) -> Result<String> {
    let base_lines: Vec<&str> = base.lines().collect();
    let ours_lines: Vec<&str> = ours.lines().collect();
    let theirs_lines: Vec<&str> = theirs.lines().collect();

    let ours_ops = capture_diff_slices(Algorithm::Myers, &base_lines, &ours_lines);
    let theirs_ops = capture_diff_slices(Algorithm::Myers, &base_lines, &theirs_lines);

    let ours_edits = edits_from_ops(&ours_ops, &ours_lines);
    let theirs_edits = edits_from_ops(&theirs_ops, &theirs_lines);

    let mut merged = Vec::new();
    let mut cursor = 0usize;

    while cursor < base_lines.len() {
        merge_insertions_at(cursor, &ours_edits, &theirs_edits, &mut merged)?;

        let ours_here = ours_edits.spans.iter().find(|e| e.base_start == cursor);
        let theirs_here = theirs_edits.spans.iter().find(|e| e.base_start == cursor);

        match (ours_here, theirs_here) {
            (Some(o), Some(t)) => {
                if o.base_end == t.base_end && o.replacement == t.replacement {
                    merged.extend(o.replacement.iter().cloned());
                    cursor = o.base_end;
                } else {
                    return Err(PfscError::ShadowMergeConflict(format!(
                        "conflicting edits at base line {cursor}"
                    )));
                }
            }
            (Some(o), None) => {
                merged.extend(o.replacement.iter().cloned());
                cursor = o.base_end;
            }
            (None, Some(t)) => {
                merged.extend(t.replacement.iter().cloned());
                cursor = t.base_end;
            }
            (None, None) => {
                merged.push(base_lines[cursor].to_string());
                cursor += 1;
            }
        }
    }
    merge_insertions_at(base_lines.len(), &ours_edits, &theirs_edits, &mut merged)?;

    Ok(merged.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_is_a_no_op_commit() {
        let mut blobs = BlobStore::new();
        let mut history = ShadowHistory::new();
        let files = BTreeMap::from([("a.pfsc".to_string(), b"hello".to_vec())]);
        let first = history.commit(&mut blobs, "first", &files);
        let second = history.commit(&mut blobs, "second", &files);
        assert_eq!(first, second);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn changed_content_appends_a_new_commit() {
        let mut blobs = BlobStore::new();
        let mut history = ShadowHistory::new();
        let v1 = BTreeMap::from([("a.pfsc".to_string(), b"hello".to_vec())]);
        let v2 = BTreeMap::from([("a.pfsc".to_string(), b"goodbye".to_vec())]);
        let first = history.commit(&mut blobs, "v1", &v1);
        let second = history.commit(&mut blobs, "v2", &v2);
        assert_ne!(first, second);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(&second).unwrap().parent.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn identical_content_is_deduplicated_in_the_blob_store() {
        let mut blobs = BlobStore::new();
        let h1 = blobs.put(b"same content");
        let h2 = blobs.put(b"same content");
        assert_eq!(h1, h2);
    }

    #[test]
    fn three_way_merge_combines_non_overlapping_edits() {
        let base = "one\ntwo\nthree";
        let ours = "ONE\ntwo\nthree";
        let theirs = "one\ntwo\nTHREE";
        let merged = merge_three_way(base, ours, theirs).unwrap();
        assert_eq!(merged, "ONE\ntwo\nTHREE");
    }

    #[test]
    fn three_way_merge_conflicts_on_overlapping_differing_edits() {
        let base = "one\ntwo\nthree";
        let ours = "ONE\ntwo\nthree";
        let theirs = "one-changed-differently\ntwo\nthree";
        assert!(merge_three_way(base, ours, theirs).is_err());
    }

    #[test]
    fn three_way_merge_is_a_no_op_when_neither_side_changes() {
        let base = "one\ntwo\nthree";
        let merged = merge_three_way(base, base, base).unwrap();
        assert_eq!(merged, base);
    }
}
