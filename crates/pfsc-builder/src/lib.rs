//! Build orchestration (spec §4.10): turns a `BuildRequest` into an indexed,
//! artifact-recorded, manifest-merged build by driving `pfsc-repo`,
//! `pfsc-parser`, `pfsc-resolver`, `pfsc-meson`, `pfsc-dashgraph`,
//! `pfsc-index`, `pfsc-graph` and `pfsc-manifest` through the seven phases
//! spec.md §4.10 lists, one repo-version pair at a time (spec §5).

mod cache;
mod monitor;
mod orchestrate;
mod request;
mod scan;

pub use cache::ModuleCache;
pub use monitor::{BuildMonitor, MonitorEvent};
pub use orchestrate::Builder;
pub use request::BuildRequest;
pub use scan::{scan_module, ScannedModule};
