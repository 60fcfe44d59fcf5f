//! The tree a module parse produces. No semantic resolution happens here:
//! names are plain strings, not yet bound to entities (spec §4.2).

use crate::json::Value;
use crate::lexer::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Import {
    /// `import LP [as N]`
    Direct { libpath: String, alias: Option<String>, span: Span },
    /// `from LP import N [as N, ...]`, including relative (`.`-prefixed)
    /// `LP`.
    From { module: String, names: Vec<(String, Option<String>)>, span: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defn {
    pub name: String,
    pub definiendum: String,
    pub definiens: String,
    pub span: Span,
}

/// A deduction's header, with its internal proof-graph content left as raw
/// text: the Meson/arc-listing grammar (spec §4.3) is a distinct sublanguage
/// owned by `pfsc-meson`, parsed lazily once the deduction's targets are
/// known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduc {
    pub name: String,
    pub of_targets: Vec<String>,
    pub with_targets: Vec<String>,
    pub body: String,
    pub span: Span,
}

/// `anno NAME @@@ ... @@@`; `raw` is the untouched text between delimiters,
/// V&E-sanitised and markdown-rendered only at render time (spec §4.5/4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anno {
    pub name: String,
    pub raw: String,
    pub span: Span,
}

/// A repo root module's `excepts { moved: {...}, deletions: [...] }` block
/// (spec §4.7): the change log a numbered release's build reads to satisfy
/// the `MissingRepoChangeLog` guard and to drive the index diff's move
/// mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogDecl {
    pub moved: Vec<(String, String)>,
    pub deletions: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Import(Import),
    Assignment(Assignment),
    Defn(Defn),
    Deduc(Deduc),
    Anno(Anno),
    ChangeLog(ChangeLogDecl),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleTree {
    pub items: Vec<Item>,
}
