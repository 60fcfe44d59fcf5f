//! Post-binding semantic checks N1/N2/E1–E5 (spec §4.3), run once every
//! dummy node in a [`Graph`] has been bound to the actual pfsc entity it
//! names. Binding itself is the resolver's job; this crate only needs to
//! ask a handful of questions about each bound entity, captured here as the
//! [`NodeSemantics`] trait so `pfsc-meson` has no dependency on
//! `pfsc-resolver`.

use crate::graph::{Graph, GraphSource};
use pfsc_errors::PfscError;

/// What the resolver knows about the entity a dummy node name refers to.
pub trait NodeSemantics {
    fn is_modal(&self, name: &str) -> bool;
    fn is_subdeduc(&self, name: &str) -> bool;
    /// `Some(target_libpath)` if this name is a ghost node standing in for
    /// another entity.
    fn ghost_of(&self, name: &str) -> Option<String>;
    fn libpath(&self, name: &str) -> String;
    fn declared_locally(&self, name: &str) -> bool;
    /// Name of the dummy node standing for this entity's syntactic parent,
    /// if that parent also happens to be named in the same graph.
    fn parent(&self, name: &str) -> Option<String>;
}

/// Runs checks (N1), (N2), (E1)-(E5) against `targets`' libpaths.
pub fn semantic_check(
    graph: &Graph,
    sem: &dyn NodeSemantics,
    target_libpaths: &[String],
) -> Result<(), PfscError> {
    // (N1)/(N2)
    for node in graph.nodes() {
        let is_modal = sem.is_modal(&node.name);
        if graph.src_type == Some(GraphSource::Meson)
            && is_modal
            && sem.declared_locally(&node.name)
            && !node.first_occurs_in_supposition
        {
            return Err(PfscError::MesonMissingModal(node.name.clone()));
        } else if node.first_occurs_in_supposition && !is_modal {
            return Err(PfscError::MesonExcessModal(node.name.clone()));
        }
    }

    let mut undeduced: Vec<String> = target_libpaths.to_vec();
    let mut endpairs = std::collections::HashSet::new();
    let mut outflow = std::collections::HashSet::new();
    let mut inflow = std::collections::HashSet::new();

    for e in graph.edges() {
        let (sn, tn) = (&e.src, &e.tgt);

        // (E1)
        if e.kind == crate::graph::EdgeKind::Ded {
            let t_sub = sem.is_subdeduc(tn);
            let t_modal = sem.is_modal(tn);
            if t_sub || t_modal {
                return Err(PfscError::MesonExcessArrow(sn.clone(), tn.clone()));
            }
        }

        // (E2)
        if e.kind == crate::graph::EdgeKind::Flow {
            if outflow.contains(sn) || inflow.contains(tn) {
                let prob = if outflow.contains(sn) { sn.clone() } else { tn.clone() };
                return Err(PfscError::MesonExcessFlow(prob));
            }
            outflow.insert(sn.clone());
            inflow.insert(tn.clone());
        }

        // (E3)
        let mut pair = [sn.clone(), tn.clone()];
        pair.sort();
        let key = pair.join(",");
        if !endpairs.insert(key) {
            return Err(PfscError::MesonExcessArrow(sn.clone(), tn.clone()));
        }

        // (E4)
        let s_ghost = sem.ghost_of(sn);
        let t_ghost_is_ghost = sem.ghost_of(tn).is_some();
        if let Some(ghost_target) = &s_ghost {
            if !t_ghost_is_ghost && target_libpaths.contains(ghost_target) {
                return Err(PfscError::MesonDownwardFlow(sn.clone()));
            }
        }

        // prep for (E5)
        if e.kind == crate::graph::EdgeKind::Ded || e.kind == crate::graph::EdgeKind::Flow {
            let tlp = sem.ghost_of(tn).unwrap_or_else(|| sem.libpath(tn));
            undeduced.retain(|u| u != &tlp);
        }
    }

    // (E5)
    if !undeduced.is_empty() {
        return Err(PfscError::MesonDidNotDeliver(undeduced.join(", ")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphSource};
    use std::collections::HashMap;

    struct FakeSem {
        modal: HashMap<String, bool>,
    }
    impl NodeSemantics for FakeSem {
        fn is_modal(&self, name: &str) -> bool {
            *self.modal.get(name).unwrap_or(&false)
        }
        fn is_subdeduc(&self, _name: &str) -> bool {
            false
        }
        fn ghost_of(&self, _name: &str) -> Option<String> {
            None
        }
        fn libpath(&self, name: &str) -> String {
            name.to_string()
        }
        fn declared_locally(&self, _name: &str) -> bool {
            true
        }
        fn parent(&self, _name: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn passes_for_simple_deduced_target() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "thm", EdgeKind::Ded);
        let sem = FakeSem { modal: HashMap::new() };
        assert!(semantic_check(&g, &sem, &["thm".to_string()]).is_ok());
    }

    #[test]
    fn fails_when_target_undeduced() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        let sem = FakeSem { modal: HashMap::new() };
        assert!(semantic_check(&g, &sem, &["thm".to_string()]).is_err());
    }

    #[test]
    fn fails_on_duplicate_arrow() {
        let mut g = Graph::new(GraphSource::Arcs);
        g.create_edge("a", "b", EdgeKind::Ded);
        g.create_edge("a", "b", EdgeKind::Ded);
        let sem = FakeSem { modal: HashMap::new() };
        assert!(semantic_check(&g, &sem, &["b".to_string()]).is_err());
    }
}
