//! Configuration management for sonda.
//!
//! Settings come from an optional YAML file and are then overridden by
//! environment variables, so a deployment can keep one shared file and still
//! point a single process at a different tree.
//!
//! ```yaml
//! roots:
//!   staging: /srv/protheus/hml/fontes
//!   production: /srv/protheus/prd/fontes
//!   standard: /srv/protheus/padrao
//! search:
//!   max-results: 50
//!   table-depth: 12
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable holding the path of the YAML config file.
pub const CONFIG_PATH_VAR: &str = "SONDA_CONFIG";
/// Environment variable holding the staging (homologation) tree root.
pub const STAGING_ROOT_VAR: &str = "SONDA_STAGING_ROOT";
/// Environment variable holding the production tree root.
pub const PRODUCTION_ROOT_VAR: &str = "SONDA_PRODUCTION_ROOT";
/// Environment variable holding the vendor-standard tree root.
pub const STANDARD_ROOT_VAR: &str = "SONDA_STANDARD_ROOT";
/// Environment variable overriding the default table search cap.
pub const MAX_RESULTS_VAR: &str = "SONDA_MAX_RESULTS";

/// Default cap on table search rows.
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default walk depth when looking up a single routine.
pub const DEFAULT_ROUTINE_DEPTH: usize = 5;
/// Default walk depth when searching every routine for a table.
pub const DEFAULT_TABLE_DEPTH: usize = 12;
/// Default walk depth for the standard-prefix discovery pass.
pub const DEFAULT_DISCOVERY_DEPTH: usize = 3;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SondaConfig {
    /// Filesystem roots per environment.
    pub roots: RootsConfig,

    /// Search limits.
    pub search: SearchConfig,
}

/// Filesystem roots per environment. Unset roots fail fast when requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootsConfig {
    /// Customer staging tree.
    pub staging: Option<PathBuf>,
    /// Customer production tree.
    pub production: Option<PathBuf>,
    /// Vendor-supplied standard tree.
    pub standard: Option<PathBuf>,
}

/// Limits applied to walks and searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Default maximum number of table search rows.
    pub max_results: usize,
    /// Walk depth for single routine lookups.
    pub routine_depth: usize,
    /// Walk depth for table searches.
    pub table_depth: usize,
    /// Walk depth for the discovery pass over the standard tree.
    pub discovery_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            routine_depth: DEFAULT_ROUTINE_DEPTH,
            table_depth: DEFAULT_TABLE_DEPTH,
            discovery_depth: DEFAULT_DISCOVERY_DEPTH,
        }
    }
}

impl SondaConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it is not valid YAML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Build the effective configuration for a process.
    ///
    /// Reads `explicit_path` if given, otherwise the file named by
    /// [`CONFIG_PATH_VAR`] if set, otherwise starts from defaults; then
    /// applies environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file was named but cannot be loaded, or
    /// if an override variable holds an invalid value.
    pub fn discover(explicit_path: Option<&Path>) -> Result<Self> {
        let file = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                Self::load(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if [`MAX_RESULTS_VAR`] is not a positive integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = non_empty(STAGING_ROOT_VAR) {
            self.roots.staging = Some(PathBuf::from(value));
        }
        if let Some(value) = non_empty(PRODUCTION_ROOT_VAR) {
            self.roots.production = Some(PathBuf::from(value));
        }
        if let Some(value) = non_empty(STANDARD_ROOT_VAR) {
            self.roots.standard = Some(PathBuf::from(value));
        }
        if let Some(value) = non_empty(MAX_RESULTS_VAR) {
            self.search.max_results = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{MAX_RESULTS_VAR} must be a positive integer, got '{value}'"
                    ))
                })?;
        }
        Ok(())
    }
}
