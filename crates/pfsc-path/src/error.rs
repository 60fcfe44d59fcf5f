use thiserror::Error;

/// Errors raised while parsing or validating libpaths, multipaths, and versions.
///
/// Variant names track the stable error identifiers of the input-validation
/// taxonomy (`INPUT_EMPTY`, `INPUT_TOO_LONG`, `BAD_LIBPATH`, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("libpath segment is empty")]
    InputEmpty,

    #[error("libpath segment too long: \"{truncated}...\"")]
    InputTooLong { truncated: String },

    #[error("bad libpath: {0}")]
    BadLibpath(String),

    #[error("multipath has unbalanced braces: {0}")]
    UnbalancedBraces(String),

    #[error("malformed versioned libpath: {0}")]
    MalformedVersionedLibpath(String),

    #[error("bad version string: {0}")]
    BadVersion(String),

    #[error("repo libpath must have exactly 3 segments, got {0}")]
    NotARepoLibpath(usize),
}

pub type Result<T> = std::result::Result<T, PathError>;
