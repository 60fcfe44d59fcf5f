//! Resolution pass over a parsed module set: imports, target binding,
//! ancestor-scope references, alternate closure, widget ordering, and
//! origin injection (spec §4.4).

mod ancestor;
mod ghost;
mod imports;
mod origin;
mod target;
mod unionfind;
mod widgets;

pub use ancestor::{resolve_against_ancestors, Scope};
pub use ghost::{mirror_ancestor_chain, AncestorLink, GhostNode};
pub use imports::{check_no_cyclic_imports, direct_dependencies, resolve_import_targets};
pub use origin::{inject_origins, OriginSource};
pub use target::{pin_target, TargetBinding};
pub use unionfind::alternate_closure;
pub use widgets::topo_sort_widgets;
