//! Origin injection (spec §4.4 step 6): every resolved node/deduction
//! carries the `Origin` (`libpath@major`) of the module version that first
//! declared it. The index is the source of truth for this, so this crate
//! only defines the seam it reads through — `pfsc-builder` wires the real
//! `pfsc-index`-backed implementation in.

use pfsc_path::Origin;

pub trait OriginSource {
    fn origin_of(&self, libpath: &str) -> Option<Origin>;
}

/// Injects an origin for every libpath that the index already knows about;
/// libpaths declared for the first time in this build have no origin yet
/// (the index assigns one once this build is indexed).
pub fn inject_origins(libpaths: &[String], source: &dyn OriginSource) -> Vec<(String, Option<Origin>)> {
    libpaths.iter().map(|lp| (lp.clone(), source.origin_of(lp))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_path::Libpath;
    use std::collections::HashMap;

    struct FakeIndex(HashMap<String, Origin>);
    impl OriginSource for FakeIndex {
        fn origin_of(&self, libpath: &str) -> Option<Origin> {
            self.0.get(libpath).cloned()
        }
    }

    #[test]
    fn known_libpath_gets_its_origin() {
        let origin = Origin::new(Libpath::parse("a.b").unwrap(), 1);
        let mut map = HashMap::new();
        map.insert("a.b.Thm".to_string(), origin.clone());
        let idx = FakeIndex(map);
        let result = inject_origins(&["a.b.Thm".to_string(), "a.b.Other".to_string()], &idx);
        assert_eq!(result[0].1, Some(origin));
        assert_eq!(result[1].1, None);
    }
}
