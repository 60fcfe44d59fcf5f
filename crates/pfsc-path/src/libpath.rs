//! Libpaths: dot-joined, case-sensitive, alphanumeric-underscore segments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};

pub const MAX_LIBSEG_LEN: usize = 128;
pub const MAX_LIBPATH_LEN: usize = 2048;

const RESERVED_SEGMENTS: &[&str] = &["true", "false", "null"];

/// A single dot-separated segment of a libpath.
///
/// Ordinary segments match `[A-Za-z_][A-Za-z0-9_]*`. The synthetic node-name
/// forms `?name` (question node) and `!name` (ucon node) are also accepted,
/// since they appear as the final segment of a node's libpath (§3.6).
fn validate_segment(seg: &str) -> Result<()> {
    if seg.is_empty() {
        return Err(PathError::InputEmpty);
    }
    if seg.len() > MAX_LIBSEG_LEN {
        let truncated: String = seg.chars().take(32).collect();
        return Err(PathError::InputTooLong { truncated });
    }
    let mut chars = seg.chars();
    let first = chars.next().unwrap();
    let body_ok = if first == '?' || first == '!' {
        chars.clone().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.clone().all(|c| c.is_ascii_alphanumeric() || c == '_')
    } else {
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if !body_ok {
        return Err(PathError::BadLibpath(format!("bad segment format: {seg}")));
    }
    if RESERVED_SEGMENTS.contains(&seg) {
        return Err(PathError::BadLibpath(format!("reserved segment: {seg}")));
    }
    Ok(())
}

fn is_user_supplied_underscore_segment(seg: &str) -> bool {
    seg.starts_with('_') && !RESERVED_SEGMENTS.contains(&seg)
}

/// An ordered, dot-joined sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Libpath(String);

impl Libpath {
    /// Parse and validate a dotted libpath string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(PathError::InputEmpty);
        }
        if s.len() > MAX_LIBPATH_LEN {
            let truncated: String = s.chars().take(32).collect();
            return Err(PathError::InputTooLong { truncated });
        }
        for seg in s.split('.') {
            validate_segment(seg)?;
            if is_user_supplied_underscore_segment(seg) {
                return Err(PathError::BadLibpath(format!(
                    "user-supplied segment may not start with underscore: {seg}"
                )));
            }
        }
        Ok(Libpath(s.to_string()))
    }

    /// Build a libpath from already-validated segments, without re-checking
    /// the underscore-prefix rule (used internally when synthesizing ghost /
    /// move-conjugate paths that legitimately reuse an ancestor's segments).
    pub fn from_segments<I, S>(segs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segs
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::parse(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }

    pub fn len_segments(&self) -> usize {
        self.0.matches('.').count() + 1
    }

    /// The parent libpath, or `None` if this is a top-level (single-segment)
    /// libpath.
    pub fn parent(&self) -> Option<Libpath> {
        let segs = self.segments();
        if segs.len() <= 1 {
            return None;
        }
        Some(Libpath(segs[..segs.len() - 1].join(".")))
    }

    /// True iff `self` is a proper descendant of `other`, i.e. `other` is a
    /// strict prefix of `self` at a segment boundary.
    pub fn descends_from(&self, other: &Libpath) -> bool {
        if self == other {
            return false;
        }
        let self_segs = self.segments();
        let other_segs = other.segments();
        other_segs.len() < self_segs.len() && self_segs[..other_segs.len()] == other_segs[..]
    }

    /// True iff `self == other` or `self` descends from `other`.
    pub fn is_or_descends_from(&self, other: &Libpath) -> bool {
        self == other || self.descends_from(other)
    }

    /// The three-segment repository root of this libpath.
    pub fn repo_root(&self) -> Result<Libpath> {
        let segs = self.segments();
        if segs.len() < 3 {
            return Err(PathError::NotARepoLibpath(segs.len()));
        }
        Ok(Libpath(segs[..3].join(".")))
    }

    /// Append a single segment, returning a new libpath.
    pub fn child(&self, seg: &str) -> Result<Libpath> {
        validate_segment(seg)?;
        Ok(Libpath(format!("{}.{}", self.0, seg)))
    }
}

impl fmt::Display for Libpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Libpath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self> {
        Libpath::parse(s)
    }
}

/// An entity's identity, invariant under moves/renames: `libpath@major`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub libpath: Libpath,
    pub major: u32,
}

impl Origin {
    pub fn new(libpath: Libpath, major: u32) -> Self {
        Origin { libpath, major }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.libpath, self.major)
    }
}

impl FromStr for Origin {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        let (lp, maj) = s
            .rsplit_once('@')
            .ok_or_else(|| PathError::BadLibpath(format!("not an origin: {s}")))?;
        let libpath = Libpath::parse(lp)?;
        let major = maj
            .parse::<u32>()
            .map_err(|_| PathError::BadLibpath(format!("bad origin major: {s}")))?;
        Ok(Origin { libpath, major })
    }
}

/// Expand a multipath (`a.b.{c,d.{e,f}}`) into its constituent libpaths, in
/// document order. Recursive-descent over the comma/brace grammar,
/// mirroring `BoxListing`'s brace-depth scanner in the original
/// implementation.
pub fn expand_multipath(raw: &str) -> Result<Vec<Libpath>> {
    let expanded = expand_segments(raw)?;
    expanded
        .into_iter()
        .map(|s| Libpath::parse(&s))
        .collect()
}

fn expand_segments(raw: &str) -> Result<Vec<String>> {
    // Split on the first unbraced '.', then recurse on the tail if it
    // contains a `{...}` group.
    if let Some(brace_start) = find_top_level_brace(raw)? {
        let prefix = &raw[..brace_start];
        let prefix = prefix.strip_suffix('.').unwrap_or(prefix);
        let close = matching_close_brace(raw, brace_start)?;
        let inner = &raw[brace_start + 1..close];
        let rest = &raw[close + 1..];
        if !rest.is_empty() {
            return Err(PathError::UnbalancedBraces(raw.to_string()));
        }
        let alts = split_top_level_commas(inner);
        let mut out = Vec::new();
        for alt in alts {
            for suffix in expand_segments(&alt)? {
                if prefix.is_empty() {
                    out.push(suffix);
                } else {
                    out.push(format!("{prefix}.{suffix}"));
                }
            }
        }
        Ok(out)
    } else {
        Ok(vec![raw.to_string()])
    }
}

fn find_top_level_brace(s: &str) -> Result<Option<usize>> {
    let mut depth: i32 = 0;
    for (i, c) in s.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    return Ok(Some(i));
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(PathError::UnbalancedBraces(s.to_string()));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(PathError::UnbalancedBraces(s.to_string()));
    }
    Ok(None)
}

fn matching_close_brace(s: &str, open: usize) -> Result<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(PathError::UnbalancedBraces(s.to_string()))
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut cur = String::new();
    for c in s.chars() {
        match c {
            '{' => {
                depth += 1;
                cur.push(c);
            }
            '}' => {
                depth -= 1;
                cur.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut cur));
            }
            _ => cur.push(c),
        }
    }
    parts.push(cur);
    parts
}

/// A repo-versioned libpath: `host.user.repo@vers.remainder`. The `@` is
/// found by scanning strictly within the first three segments, per §4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoVersionedLibpath {
    pub repo: Libpath,
    pub version: crate::version::Version,
    pub remainder: Option<Libpath>,
}

pub fn parse_repo_versioned_libpath(s: &str) -> Result<RepoVersionedLibpath> {
    // Find the '@' first, independent of the dot-splitting used for the
    // version tail: the version itself contains dots (`v1.2.3`), so we
    // can't split the whole string on '.' before we know where it ends.
    let at_pos = s
        .find('@')
        .ok_or_else(|| PathError::MalformedVersionedLibpath(s.to_string()))?;
    let before = &s[..at_pos];
    let after = &s[at_pos + 1..];

    // The '@' must occur inside one of the first three segments, i.e. the
    // text before it spans at most 3 segments.
    let before_segs: Vec<&str> = before.split('.').collect();
    if before_segs.is_empty() || before_segs.iter().any(|seg| seg.is_empty()) || before_segs.len() > 3 {
        return Err(PathError::MalformedVersionedLibpath(s.to_string()));
    }

    // Split the text after '@' on '.' independently, then pull exactly the
    // tokens the version needs off the front: one (`WIP`) or three
    // (`M`, `m`, `p`, rejoined into `vM.m.p` for `Version::from_str`).
    let after_tokens: Vec<&str> = after.split('.').collect();
    if after_tokens.is_empty() || after_tokens[0].is_empty() {
        return Err(PathError::MalformedVersionedLibpath(s.to_string()));
    }
    let (version, rest_tokens): (crate::version::Version, &[&str]) = if after_tokens[0] == "WIP" {
        (crate::version::Version::Wip, &after_tokens[1..])
    } else {
        if after_tokens.len() < 3 {
            return Err(PathError::MalformedVersionedLibpath(s.to_string()));
        }
        let vs = format!("{}.{}.{}", after_tokens[0], after_tokens[1], after_tokens[2]);
        let version = vs
            .parse()
            .map_err(|_| PathError::MalformedVersionedLibpath(s.to_string()))?;
        (version, &after_tokens[3..])
    };

    let mut repo_segs: Vec<&str> = before_segs;
    // Pad out to 3 segments using the remaining literal repo segments after
    // the version, if the '@' landed before segment index 2.
    let mut remaining: Vec<&str> = rest_tokens.to_vec();
    while repo_segs.len() < 3 {
        if remaining.is_empty() {
            return Err(PathError::MalformedVersionedLibpath(s.to_string()));
        }
        repo_segs.push(remaining.remove(0));
    }
    let repo = Libpath::from_segments(repo_segs)?;
    let remainder = if remaining.is_empty() {
        None
    } else {
        Some(Libpath::from_segments(remaining)?)
    };
    Ok(RepoVersionedLibpath { repo, version, remainder })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let p = Libpath::parse("a.b.c_1").unwrap();
        assert_eq!(p.as_str(), "a.b.c_1");
        assert_eq!(p.to_string().parse::<Libpath>().unwrap(), p);
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(Libpath::parse("a..b").is_err());
    }

    #[test]
    fn rejects_reserved_segments() {
        assert!(Libpath::parse("a.true.b").is_err());
        assert!(Libpath::parse("a.null").is_err());
    }

    #[test]
    fn rejects_user_underscore_prefix() {
        assert!(Libpath::parse("a._hidden").is_err());
    }

    #[test]
    fn parent_and_descends_from() {
        let child = Libpath::parse("a.b.c").unwrap();
        let parent = Libpath::parse("a.b").unwrap();
        assert_eq!(child.parent().unwrap(), parent);
        assert!(child.descends_from(&parent));
        assert!(!parent.descends_from(&child));
        assert!(!child.descends_from(&child));
    }

    #[test]
    fn expand_multipath_basic() {
        let got = expand_multipath("a.b.{c,d.{e,f}}").unwrap();
        let got: Vec<String> = got.into_iter().map(|l| l.to_string()).collect();
        assert_eq!(got, vec!["a.b.c", "a.b.d.e", "a.b.d.f"]);
    }

    #[test]
    fn expand_multipath_no_braces() {
        let got = expand_multipath("a.b.c").unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].to_string(), "a.b.c");
    }

    #[test]
    fn expand_multipath_unbalanced() {
        assert!(expand_multipath("a.{b,c").is_err());
        assert!(expand_multipath("a.b}").is_err());
    }

    #[test]
    fn origin_round_trip() {
        let o: Origin = "host.user.repo.Foo@3".parse().unwrap();
        assert_eq!(o.to_string(), "host.user.repo.Foo@3");
    }

    #[test]
    fn repo_versioned_libpath_basic() {
        let rvl = parse_repo_versioned_libpath("host.user.repo@v1.2.3.sub.path").unwrap();
        assert_eq!(rvl.repo.to_string(), "host.user.repo");
        assert_eq!(rvl.version.to_string(), "v1.2.3");
        assert_eq!(rvl.remainder.unwrap().to_string(), "sub.path");
    }

    #[test]
    fn repo_versioned_libpath_no_remainder() {
        let rvl = parse_repo_versioned_libpath("host.user.repo@WIP").unwrap();
        assert!(rvl.remainder.is_none());
        assert!(rvl.version.is_wip());
    }

    proptest::proptest! {
        #[test]
        fn parse_display_round_trip(
            a in "[a-zA-Z_][a-zA-Z0-9_]{0,10}",
            b in "[a-zA-Z_][a-zA-Z0-9_]{0,10}",
        ) {
            let s = format!("{a}.{b}");
            if let Ok(lp) = Libpath::parse(&s) {
                proptest::prop_assert_eq!(lp.to_string(), s);
            }
        }
    }
}
