//! Symmetric/transitive closure of `alternate` relations across a
//! deduction's `supp` nodes (spec §4.4 step 4), computed with a
//! path-compressing, union-by-rank union-find.

use std::collections::HashMap;

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Given the declared `supp` node names and the direct `alternate` pairs
/// among them, returns each node's full alternate class (including itself),
/// keyed by node name.
pub fn alternate_closure(supp_names: &[String], pairs: &[(String, String)]) -> HashMap<String, Vec<String>> {
    let index: HashMap<&str, usize> = supp_names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut uf = UnionFind::new(supp_names.len());
    for (a, b) in pairs {
        if let (Some(&ia), Some(&ib)) = (index.get(a.as_str()), index.get(b.as_str())) {
            uf.union(ia, ib);
        }
    }
    let mut classes: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, name) in supp_names.iter().enumerate() {
        let root = uf.find(i);
        classes.entry(root).or_default().push(name.clone());
    }
    let mut result = HashMap::new();
    for members in classes.values() {
        for name in members {
            result.insert(name.clone(), members.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitive_closure_merges_chained_alternates() {
        let names = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
        let pairs = vec![("s1".to_string(), "s2".to_string()), ("s2".to_string(), "s3".to_string())];
        let classes = alternate_closure(&names, &pairs);
        let mut class_s1 = classes["s1"].clone();
        class_s1.sort();
        assert_eq!(class_s1, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn unrelated_nodes_stay_singleton() {
        let names = vec!["s1".to_string(), "s2".to_string()];
        let classes = alternate_closure(&names, &[]);
        assert_eq!(classes["s1"], vec!["s1".to_string()]);
        assert_eq!(classes["s2"], vec!["s2".to_string()]);
    }
}
