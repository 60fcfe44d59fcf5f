//! Deduction target binding: locates the entity a `deduc ... of LP, ...`
//! clause names, and pins it at the correct version — the build's own
//! version for a same-repo target, or whatever the dependencies map says
//! for a cross-repo one (spec §4.4 step 2).

use pfsc_errors::PfscError;
use pfsc_path::{Libpath, Version};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetBinding {
    pub libpath: Libpath,
    pub version: Version,
}

/// `dependencies` maps a repo libpath (the target's first three segments,
/// per `pfsc_path::parse_repo_versioned_libpath`) to the version this build
/// pins that dependency at.
pub fn pin_target(
    target_libpath: &str,
    this_repo: &str,
    this_build_version: &Version,
    dependencies: &HashMap<String, Version>,
) -> Result<TargetBinding, PfscError> {
    let libpath = Libpath::parse(target_libpath).map_err(PfscError::from)?;
    let repo_root = libpath.repo_root().map_err(PfscError::from)?;

    let version = if repo_root.as_str() == this_repo {
        this_build_version.clone()
    } else {
        dependencies
            .get(repo_root.as_str())
            .cloned()
            .ok_or_else(|| PfscError::VersionNotBuiltYet(repo_root.to_string()))?
    };

    Ok(TargetBinding { libpath, version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_repo_target_pins_to_build_version() {
        let v = Version::numbered(1, 0, 0);
        let deps = HashMap::new();
        let binding = pin_target("a.b.c.Thm", "a.b.c", &v, &deps).unwrap();
        assert_eq!(binding.version, v);
    }

    #[test]
    fn cross_repo_target_pins_to_dependency_version() {
        let this_v = Version::numbered(2, 0, 0);
        let dep_v = Version::numbered(1, 3, 0);
        let mut deps = HashMap::new();
        deps.insert("x.y.z".to_string(), dep_v.clone());
        let binding = pin_target("x.y.z.Lemma", "a.b.c", &this_v, &deps).unwrap();
        assert_eq!(binding.version, dep_v);
    }

    #[test]
    fn missing_dependency_is_an_error() {
        let this_v = Version::numbered(1, 0, 0);
        let deps = HashMap::new();
        assert!(pin_target("x.y.z.Lemma", "a.b.c", &this_v, &deps).is_err());
    }
}
