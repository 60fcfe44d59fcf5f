//! Module grammar lexer/parser, JSON sublanguage, and free-string sanitiser
//! for pfsc modules (spec §4.2, §4.5). Produces an unresolved [`ast::ModuleTree`];
//! name resolution is `pfsc-resolver`'s job.

mod ast;
mod json;
mod lexer;
pub mod markdown;
mod module;
mod render;
mod vertex;

pub use ast::{Anno, Assignment, ChangeLogDecl, Defn, Deduc, Import, Item, ModuleTree};
pub use json::{parse_value_from_str, Value};
pub use lexer::Span;
pub use markdown::{extract_widgets, render_anno_markdown, WidgetStub};
pub use module::parse_module;
pub use render::render_module;
pub use vertex::{html_escape, translate_vertex, vertex_and_escape, VERTEX_KEY_CHAR};
