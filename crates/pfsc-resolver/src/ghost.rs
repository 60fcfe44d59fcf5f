//! Ghost nodes (spec §3.7): when a deduction references an entity outside
//! itself — typically the statement it proves, named in its `of` clause —
//! a ghost node mirrors the referent's ancestor chain inside the
//! deduction's own namespace, so the deduction's internal proof graph can
//! point at pieces of the referent using names local to the deduction.
//! Repeated references to the same referent from within one deduction
//! reuse the same ghost rather than minting a fresh one each time.

use std::collections::HashMap;

/// One link in an ancestor chain, root to leaf: the segment name the ghost
/// takes inside the deduction, and the real libpath it stands for.
#[derive(Debug, Clone)]
pub struct AncestorLink {
    pub segment: String,
    pub real_libpath: String,
}

/// A ghost node mirroring one real libpath inside a deduction's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostNode {
    pub ghost_libpath: String,
    pub real_libpath: String,
}

/// Mirrors `chain` (root-to-leaf) inside `deduc_libpath`'s namespace.
/// `existing` is keyed by real libpath and shared across every call for one
/// deduction, so a referent already ghosted earlier in the same deduction
/// is returned unchanged (its `realObj()` stays the same ghost node) rather
/// than being re-minted under a new path.
pub fn mirror_ancestor_chain(
    deduc_libpath: &str,
    chain: &[AncestorLink],
    existing: &mut HashMap<String, GhostNode>,
) -> Vec<GhostNode> {
    let mut out = Vec::with_capacity(chain.len());
    let mut prefix = deduc_libpath.to_string();
    for link in chain {
        let candidate_path = format!("{prefix}.{}", link.segment);
        let ghost = existing
            .entry(link.real_libpath.clone())
            .or_insert_with(|| GhostNode {
                ghost_libpath: candidate_path,
                real_libpath: link.real_libpath.clone(),
            })
            .clone();
        prefix = ghost.ghost_libpath.clone();
        out.push(ghost);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_a_single_link_chain() {
        let mut existing = HashMap::new();
        let chain = [AncestorLink { segment: "Thm".to_string(), real_libpath: "a.b.c.Thm".to_string() }];
        let ghosts = mirror_ancestor_chain("a.b.d.Pf", &chain, &mut existing);
        assert_eq!(ghosts.len(), 1);
        assert_eq!(ghosts[0].ghost_libpath, "a.b.d.Pf.Thm");
        assert_eq!(ghosts[0].real_libpath, "a.b.c.Thm");
    }

    #[test]
    fn mirrors_a_multi_link_ancestor_chain() {
        let mut existing = HashMap::new();
        let chain = [
            AncestorLink { segment: "Thm".to_string(), real_libpath: "a.b.c.Thm".to_string() },
            AncestorLink { segment: "p1".to_string(), real_libpath: "a.b.c.Thm.p1".to_string() },
        ];
        let ghosts = mirror_ancestor_chain("a.b.d.Pf", &chain, &mut existing);
        assert_eq!(ghosts[0].ghost_libpath, "a.b.d.Pf.Thm");
        assert_eq!(ghosts[1].ghost_libpath, "a.b.d.Pf.Thm.p1");
    }

    #[test]
    fn repeated_reference_reuses_the_same_ghost() {
        let mut existing = HashMap::new();
        let chain = [AncestorLink { segment: "Thm".to_string(), real_libpath: "a.b.c.Thm".to_string() }];
        let first = mirror_ancestor_chain("a.b.d.Pf", &chain, &mut existing);
        // A second reference from elsewhere in the same deduction, even
        // under a differently-named local segment, must resolve to the
        // ghost already minted for this real libpath.
        let chain2 = [AncestorLink { segment: "OtherName".to_string(), real_libpath: "a.b.c.Thm".to_string() }];
        let second = mirror_ancestor_chain("a.b.d.Pf", &chain2, &mut existing);
        assert_eq!(first[0], second[0]);
        assert_eq!(second[0].ghost_libpath, "a.b.d.Pf.Thm");
    }
}
