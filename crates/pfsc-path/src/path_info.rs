//! Filesystem classification of libpaths, behind a `FileSystem` trait so
//! callers can test without touching disk.

use crate::libpath::Libpath;

/// What a libpath resolves to on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Dir,
    SourceFile,
    Missing,
}

/// Abstraction over "does this path exist, and as what", so `pfsc-path`
/// itself stays free of filesystem dependencies.
pub trait FileSystem {
    fn is_dir(&self, rel_path: &str) -> bool;
    fn is_file(&self, rel_path: &str) -> bool;
}

/// Classify a libpath against a repo-relative filesystem view.
///
/// `lib_root` is the directory a repository's libpath segments map into
/// (dots replaced by path separators, per §6.1).
pub struct PathInfo<'a, F: FileSystem> {
    fs: &'a F,
}

impl<'a, F: FileSystem> PathInfo<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        PathInfo { fs }
    }

    fn rel_path_for(libpath: &Libpath) -> String {
        libpath.segments().join("/")
    }

    pub fn classify(&self, libpath: &Libpath) -> PathKind {
        let rel = Self::rel_path_for(libpath);
        if self.fs.is_dir(&rel) {
            return PathKind::Dir;
        }
        if self.fs.is_file(&format!("{rel}.pfsc")) {
            return PathKind::SourceFile;
        }
        PathKind::Missing
    }

    /// The longest prefix of `libpath` that is itself a module: either a
    /// `<prefix>.pfsc` source file, or a directory containing `__.pfsc`
    /// (in which case the directory's own module is addressed by `__`).
    pub fn get_modpath(&self, libpath: &Libpath) -> Option<Libpath> {
        let mut candidate = Some(libpath.clone());
        while let Some(lp) = candidate {
            match self.classify(&lp) {
                PathKind::SourceFile => return Some(lp),
                PathKind::Dir => {
                    let rel = Self::rel_path_for(&lp);
                    if self.fs.is_file(&format!("{rel}/__.pfsc")) {
                        return Some(lp);
                    }
                    candidate = lp.parent();
                }
                PathKind::Missing => {
                    candidate = lp.parent();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct FakeFs {
        dirs: HashSet<String>,
        files: HashSet<String>,
    }

    impl FileSystem for FakeFs {
        fn is_dir(&self, rel_path: &str) -> bool {
            self.dirs.contains(rel_path)
        }
        fn is_file(&self, rel_path: &str) -> bool {
            self.files.contains(rel_path)
        }
    }

    #[test]
    fn classifies_source_file() {
        let fs = FakeFs {
            dirs: HashSet::new(),
            files: ["a/b.pfsc".to_string()].into_iter().collect(),
        };
        let pi = PathInfo::new(&fs);
        let lp = Libpath::parse("a.b").unwrap();
        assert_eq!(pi.classify(&lp), PathKind::SourceFile);
    }

    #[test]
    fn classifies_dir_module_via_dunder() {
        let fs = FakeFs {
            dirs: ["a/b".to_string()].into_iter().collect(),
            files: ["a/b/__.pfsc".to_string()].into_iter().collect(),
        };
        let pi = PathInfo::new(&fs);
        let lp = Libpath::parse("a.b.c").unwrap();
        assert_eq!(pi.get_modpath(&lp).unwrap().to_string(), "a.b");
    }

    #[test]
    fn missing_path_has_no_modpath() {
        let fs = FakeFs { dirs: HashSet::new(), files: HashSet::new() };
        let pi = PathInfo::new(&fs);
        let lp = Libpath::parse("a.b.c").unwrap();
        assert!(pi.get_modpath(&lp).is_none());
    }
}
