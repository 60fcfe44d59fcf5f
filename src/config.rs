//! Binary configuration, loaded from environment variables (spec §6: this
//! workspace implements only the plain-data contracts an HTTP layer would
//! sit in front of, so the binary's own config is limited to what the
//! builder needs to run).
//!
//! Grounded on `rag-store/src/config.rs::RagConfig::from_env`'s shape:
//! required vars fail fast with a named error, optional vars fall back to a
//! sensible default, and a separate `validate` catches empty-string abuse of
//! an otherwise-present var.

use pfsc_errors::{PfscError, Result};
use std::env;
use std::path::PathBuf;

/// Where the builder checks repositories out to and persists its parse
/// cache, and (optionally) a Neo4j binding to use instead of the in-process
/// filesystem graph store.
#[derive(Clone, Debug)]
pub struct Config {
    pub workdir: PathBuf,
    pub cache_dir: PathBuf,
    pub artifact_root: PathBuf,
    pub neo4j: Option<Neo4jConfig>,
}

#[derive(Clone, Debug)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Config {
    /// Recognized vars:
    /// - `PFSC_WORKDIR` (default: `./data/checkouts`)
    /// - `PFSC_CACHE_DIR` (default: `./data/cache`)
    /// - `PFSC_ARTIFACT_ROOT` (default: `./data/artifacts`)
    /// - `PFSC_NEO4J_URI`, `PFSC_NEO4J_USER`, `PFSC_NEO4J_PASSWORD` (all
    ///   three required together to enable the Neo4j binding; otherwise the
    ///   in-process filesystem store is used)
    pub fn from_env() -> Result<Self> {
        let workdir = env::var("PFSC_WORKDIR").unwrap_or_else(|_| "./data/checkouts".to_string());
        let cache_dir = env::var("PFSC_CACHE_DIR").unwrap_or_else(|_| "./data/cache".to_string());
        let artifact_root = env::var("PFSC_ARTIFACT_ROOT").unwrap_or_else(|_| "./data/artifacts".to_string());

        let neo4j = match (env::var("PFSC_NEO4J_URI"), env::var("PFSC_NEO4J_USER"), env::var("PFSC_NEO4J_PASSWORD")) {
            (Ok(uri), Ok(user), Ok(password)) => Some(Neo4jConfig { uri, user, password }),
            (Err(_), Err(_), Err(_)) => None,
            _ => {
                return Err(PfscError::Internal(
                    "PFSC_NEO4J_URI, PFSC_NEO4J_USER and PFSC_NEO4J_PASSWORD must be set together".to_string(),
                ));
            }
        };

        let config = Config {
            workdir: PathBuf::from(workdir),
            cache_dir: PathBuf::from(cache_dir),
            artifact_root: PathBuf::from(artifact_root),
            neo4j,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [("PFSC_WORKDIR", &self.workdir), ("PFSC_CACHE_DIR", &self.cache_dir), ("PFSC_ARTIFACT_ROOT", &self.artifact_root)] {
            if path.as_os_str().is_empty() {
                return Err(PfscError::Internal(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
