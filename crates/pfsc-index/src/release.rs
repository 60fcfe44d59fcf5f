//! Release guards (spec §4.7, §7): the checks that gate a numbered-release
//! build, as distinct from the always-permitted WIP build.

use crate::diff::ModuleIndexInfo;
use pfsc_errors::PfscError;

/// Checks the release guards against a non-WIP build. Does nothing for a
/// WIP build: WIP rebuilds are always permitted.
///
/// `already_indexed`: whether `mii.repopath`@`mii.version` has been indexed
/// before. `prev_major`: the major version indexed immediately prior to
/// this one (0 if none). `wip_dependencies`: repopaths this build imports
/// that are themselves still at WIP. `stored_commit_hash`: the commit hash
/// bound by a hosting grant, if any, to compare against the checked-out one.
pub fn check_release_guards(
    mii: &ModuleIndexInfo,
    already_indexed: bool,
    prev_major: u32,
    wip_dependencies: &[String],
    stored_commit_hash: Option<&str>,
) -> Result<(), PfscError> {
    if mii.is_wip() {
        return Ok(());
    }
    if !mii.recursive {
        return Err(PfscError::AttemptedReleaseBuildOnSubRepo);
    }
    if already_indexed {
        return Err(PfscError::AttemptedReleaseReindex);
    }
    if mii.major > prev_major && prev_major != 0 && mii.change_log.moved.is_empty() && mii.change_log.deletions.is_empty() {
        return Err(PfscError::MissingRepoChangeLog);
    }
    if !wip_dependencies.is_empty() {
        return Err(PfscError::NoWipImportsInNumberedReleases);
    }
    if let Some(stored) = stored_commit_hash {
        if stored != mii.commit_hash {
            return Err(PfscError::BadHash);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeLog;
    use pfsc_path::Version;

    fn mii(major: u32, version: Version, recursive: bool, change_log: ChangeLog) -> ModuleIndexInfo {
        ModuleIndexInfo {
            repopath: "a.b.c".to_string(),
            version,
            major,
            commit_hash: "deadbeef".to_string(),
            recursive,
            change_log,
        }
    }

    #[test]
    fn wip_build_skips_all_guards() {
        let m = mii(0, Version::Wip, false, ChangeLog::default());
        assert!(check_release_guards(&m, true, 5, &["x.y.z".to_string()], Some("other")).is_ok());
    }

    #[test]
    fn release_build_must_be_recursive() {
        let m = mii(1, Version::numbered(1, 0, 0), false, ChangeLog::default());
        assert!(check_release_guards(&m, false, 0, &[], None).is_err());
    }

    #[test]
    fn release_cannot_be_reindexed() {
        let m = mii(1, Version::numbered(1, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, true, 0, &[], None).is_err());
    }

    #[test]
    fn major_bump_past_zero_requires_change_log() {
        let m = mii(2, Version::numbered(2, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, false, 1, &[], None).is_err());
    }

    #[test]
    fn major_bump_from_zero_does_not_require_change_log() {
        let m = mii(1, Version::numbered(1, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, false, 0, &[], None).is_ok());
    }

    #[test]
    fn release_rejects_wip_dependencies() {
        let m = mii(1, Version::numbered(1, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, false, 0, &["x.y.z".to_string()], None).is_err());
    }

    #[test]
    fn release_rejects_commit_hash_mismatch() {
        let m = mii(1, Version::numbered(1, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, false, 0, &[], Some("other-hash")).is_err());
    }

    #[test]
    fn release_accepts_matching_commit_hash() {
        let m = mii(1, Version::numbered(1, 0, 0), true, ChangeLog::default());
        assert!(check_release_guards(&m, false, 0, &[], Some("deadbeef")).is_ok());
    }
}
