//! Repository-on-disk concerns (spec §6.1): `.pfsc` module discovery, the
//! `checkout(ref)` capability the Builder depends on, and shadow version
//! control for WIP edits made through the editor rather than the command
//! line (spec §3.11/§4.11).

mod checkout;
mod discover;
mod shadow;

pub use checkout::{Checkout, GixCheckout};
pub use discover::{discover_modules, DiscoveredModule, DIRECTORY_MODULE_FILE, MODULE_EXTENSION};
pub use shadow::{merge_three_way, BlobStore, ShadowCommit, ShadowHistory};
