//! Topological resolution of widget dependencies within an annotation
//! (spec §4.4 step 5), via Kahn's algorithm.

use pfsc_errors::PfscError;
use std::collections::{HashMap, HashSet, VecDeque};

/// `deps` maps a widget uid to the uids it depends on (e.g. a `param`
/// widget referencing another widget's output). Returns uids in an order
/// where every widget appears after everything it depends on.
pub fn topo_sort_widgets(uids: &[String], deps: &HashMap<String, Vec<String>>) -> Result<Vec<String>, PfscError> {
    let mut indegree: HashMap<&str, usize> = uids.iter().map(|u| (u.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = uids.iter().map(|u| (u.as_str(), Vec::new())).collect();

    for uid in uids {
        for dep in deps.get(uid).into_iter().flatten() {
            *indegree.entry(uid.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(uid.as_str());
        }
    }

    let mut queue: VecDeque<&str> = uids.iter().map(|u| u.as_str()).filter(|u| indegree[u] == 0).collect();
    let mut order = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    while let Some(u) = queue.pop_front() {
        if !seen.insert(u) {
            continue;
        }
        order.push(u.to_string());
        for &d in dependents.get(u).into_iter().flatten() {
            let e = indegree.get_mut(d).unwrap();
            *e -= 1;
            if *e == 0 {
                queue.push_back(d);
            }
        }
    }

    if order.len() != uids.len() {
        return Err(PfscError::Internal("cyclic widget dependency".to_string()));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_dependency_before_dependent() {
        let uids = vec!["a".to_string(), "b".to_string()];
        let mut deps = HashMap::new();
        deps.insert("b".to_string(), vec!["a".to_string()]);
        let order = topo_sort_widgets(&uids, &deps).unwrap();
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn independent_widgets_any_order_but_complete() {
        let uids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let order = topo_sort_widgets(&uids, &HashMap::new()).unwrap();
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn cyclic_dependency_is_an_error() {
        let uids = vec!["a".to_string(), "b".to_string()];
        let mut deps = HashMap::new();
        deps.insert("a".to_string(), vec!["b".to_string()]);
        deps.insert("b".to_string(), vec!["a".to_string()]);
        assert!(topo_sort_widgets(&uids, &deps).is_err());
    }
}
