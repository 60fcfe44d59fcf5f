//! Semantic-version algebra: numbered releases plus the mutable WIP sentinel.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};

/// A full version: either the mutable WIP head, or a `major.minor.patch` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    Wip,
    Numbered { major: u32, minor: u32, patch: u32 },
}

impl Version {
    pub const WIP_TAG: &'static str = "WIP";

    pub fn numbered(major: u32, minor: u32, patch: u32) -> Self {
        Version::Numbered { major, minor, patch }
    }

    pub fn is_wip(&self) -> bool {
        matches!(self, Version::Wip)
    }

    pub fn is_major_zero(&self) -> bool {
        matches!(self, Version::Numbered { major: 0, .. })
    }

    pub fn major(&self) -> MajorVersion {
        match self {
            Version::Wip => MajorVersion::Wip,
            Version::Numbered { major, .. } => MajorVersion::Major(*major),
        }
    }

    /// True iff `self` is exactly one major version ahead of `previous`,
    /// i.e. a valid major-version increment for a release build.
    pub fn major_increment_from(&self, previous: &Version) -> bool {
        match (previous, self) {
            (Version::Numbered { major: p, .. }, Version::Numbered { major: n, .. }) => {
                *n == p + 1
            }
            _ => false,
        }
    }

    /// Zero-padded index key so lexicographic string order agrees with
    /// numeric order. Width 10 comfortably covers `u32::MAX`.
    pub fn padded_for_index(&self) -> String {
        match self {
            Version::Wip => "WIP".to_string(),
            Version::Numbered { major, minor, patch } => {
                format!("{major:010}.{minor:010}.{patch:010}")
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Wip => write!(f, "{}", Self::WIP_TAG),
            Version::Numbered { major, minor, patch } => write!(f, "v{major}.{minor}.{patch}"),
        }
    }
}

impl FromStr for Version {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        if s == Self::WIP_TAG {
            return Ok(Version::Wip);
        }
        let rest = s
            .strip_prefix('v')
            .ok_or_else(|| PathError::BadVersion(s.to_string()))?;
        let mut parts = rest.split('.');
        let (Some(maj), Some(min), Some(pat), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(PathError::BadVersion(s.to_string()));
        };
        let major = maj
            .parse::<u32>()
            .map_err(|_| PathError::BadVersion(s.to_string()))?;
        let minor = min
            .parse::<u32>()
            .map_err(|_| PathError::BadVersion(s.to_string()))?;
        let patch = pat
            .parse::<u32>()
            .map_err(|_| PathError::BadVersion(s.to_string()))?;
        Ok(Version::Numbered { major, minor, patch })
    }
}

/// Ordering treats WIP as coming after every numbered release: it is always
/// the most recent, mutable head.
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Wip, Version::Wip) => Ordering::Equal,
            (Version::Wip, _) => Ordering::Greater,
            (_, Version::Wip) => Ordering::Less,
            (
                Version::Numbered { major: am, minor: ami, patch: ap },
                Version::Numbered { major: bm, minor: bmi, patch: bp },
            ) => (am, ami, ap).cmp(&(bm, bmi, bp)),
        }
    }
}

/// The major-version component carried by every indexed kNode/kReln: either
/// the WIP sentinel, or a concrete major-version integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MajorVersion {
    Wip,
    Major(u32),
}

impl MajorVersion {
    pub fn is_wip(&self) -> bool {
        matches!(self, MajorVersion::Wip)
    }

    /// Is this major version live under the half-open interval `[major, cut)`?
    /// WIP entities are never subject to a `cut`; they are wiped wholesale
    /// on the next WIP rebuild instead (ISOLATED mode, §4.7).
    pub fn is_live_at(&self, major: MajorVersion, cut: Option<u32>) -> bool {
        match (self, major) {
            (MajorVersion::Wip, MajorVersion::Wip) => true,
            (MajorVersion::Wip, MajorVersion::Major(_)) => false,
            (MajorVersion::Major(q), MajorVersion::Major(m)) => {
                *q >= m && cut.map_or(true, |c| *q < c)
            }
            (MajorVersion::Major(_), MajorVersion::Wip) => false,
        }
    }

    pub fn padded_for_index(&self) -> String {
        match self {
            MajorVersion::Wip => "WIP".to_string(),
            MajorVersion::Major(m) => format!("{m:010}"),
        }
    }
}

impl fmt::Display for MajorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MajorVersion::Wip => write!(f, "WIP"),
            MajorVersion::Major(m) => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_version() {
        assert_eq!(
            "v1.2.3".parse::<Version>().unwrap(),
            Version::numbered(1, 2, 3)
        );
    }

    #[test]
    fn parses_wip() {
        assert_eq!("WIP".parse::<Version>().unwrap(), Version::Wip);
    }

    #[test]
    fn rejects_garbage() {
        assert!("v1.2".parse::<Version>().is_err());
        assert!("1.2.3".parse::<Version>().is_err());
        assert!("vA.B.C".parse::<Version>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in ["v0.0.0", "v10.20.30", "WIP"] {
            let v: Version = s.parse().unwrap();
            assert_eq!(v.to_string(), s);
        }
    }

    #[test]
    fn wip_sorts_after_numbered() {
        assert!(Version::Wip > Version::numbered(999, 999, 999));
    }

    #[test]
    fn padded_keys_agree_with_numeric_order() {
        let a = Version::numbered(1, 9, 9);
        let b = Version::numbered(2, 0, 0);
        assert!(a < b);
        assert!(a.padded_for_index() < b.padded_for_index());
    }

    #[test]
    fn major_increment_detection() {
        let v1 = Version::numbered(1, 0, 0);
        let v2 = Version::numbered(2, 0, 0);
        let v3 = Version::numbered(3, 0, 0);
        assert!(v2.major_increment_from(&v1));
        assert!(!v3.major_increment_from(&v1));
    }

    proptest::proptest! {
        #[test]
        fn numbered_round_trip(major in 0u32..100000, minor in 0u32..100000, patch in 0u32..100000) {
            let v = Version::numbered(major, minor, patch);
            let s = v.to_string();
            let parsed: Version = s.parse().unwrap();
            proptest::prop_assert_eq!(v, parsed);
        }
    }
}
