//! Environment token to filesystem root resolution.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PRODUCTION_ROOT_VAR, RootsConfig, STAGING_ROOT_VAR, STANDARD_ROOT_VAR};
use crate::error::{Error, Result};
use crate::names::RoutineName;

/// Logical environment a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Customer homologation tree.
    Staging,
    /// Customer production tree.
    Production,
    /// Vendor-supplied standard tree.
    Standard,
    /// Pick a concrete environment from the routine name.
    Auto,
}

impl Environment {
    /// Accepted spellings, for error messages.
    pub const VALID_TOKENS: &'static str =
        "staging|hml, production|prod|prd, standard|vendor|padrao, auto";

    /// Parse a user-supplied environment token, ignoring case.
    ///
    /// An empty token means [`Environment::Auto`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown tokens.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "staging" | "hml" => Ok(Self::Staging),
            "production" | "prod" | "prd" => Ok(Self::Production),
            "standard" | "vendor" | "padrao" => Ok(Self::Standard),
            other => Err(Error::invalid_input(format!(
                "unknown environment '{other}'. Valid values: {}",
                Self::VALID_TOKENS
            ))),
        }
    }

    /// Lower-case label used in result metadata.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Standard => "standard",
            Self::Auto => "auto",
        }
    }

    /// Resolve [`Environment::Auto`] to a concrete environment.
    ///
    /// A custom-prefixed routine lives in the customer tree (staging); any
    /// other routine is looked up in the vendor tree. Without a routine
    /// (table searches) the customer tree is used. Concrete environments are
    /// returned unchanged.
    #[must_use]
    pub fn concrete(self, routine: Option<&RoutineName>) -> Self {
        match (self, routine) {
            (Self::Auto, Some(name)) if !name.is_custom_prefixed() => Self::Standard,
            (Self::Auto, _) => Self::Staging,
            (env, _) => env,
        }
    }

    /// Name of the setting that configures this environment's root.
    #[must_use]
    pub fn setting(&self) -> &'static str {
        match self {
            Self::Staging | Self::Auto => STAGING_ROOT_VAR,
            Self::Production => PRODUCTION_ROOT_VAR,
            Self::Standard => STANDARD_ROOT_VAR,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filesystem root chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoot {
    /// Absolute path of the tree to search.
    pub root: PathBuf,
    /// Environment label (`staging`, `production`, `standard` or `manual`).
    pub environment: String,
    /// Whether the caller supplied the root explicitly.
    pub manual_override: bool,
}

/// Maps environment tokens to configured roots.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryLocator<'a> {
    roots: &'a RootsConfig,
}

impl<'a> RepositoryLocator<'a> {
    /// Create a locator over the configured roots.
    #[must_use]
    pub fn new(roots: &'a RootsConfig) -> Self {
        Self { roots }
    }

    /// Configured root for a concrete environment, if any.
    #[must_use]
    pub fn configured(&self, env: Environment) -> Option<&'a Path> {
        match env {
            Environment::Staging | Environment::Auto => self.roots.staging.as_deref(),
            Environment::Production => self.roots.production.as_deref(),
            Environment::Standard => self.roots.standard.as_deref(),
        }
    }

    /// Resolve the root a request should search.
    ///
    /// An explicit root always wins and is tagged as a manual override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationMissing`] naming the setting if the
    /// resolved environment has no configured root.
    pub fn resolve(
        &self,
        env: Environment,
        routine: Option<&RoutineName>,
        explicit_root: Option<&Path>,
    ) -> Result<ResolvedRoot> {
        if let Some(root) = explicit_root {
            debug!(root = %root.display(), "Using explicit root override");
            return Ok(ResolvedRoot {
                root: absolute(root),
                environment: "manual".to_string(),
                manual_override: true,
            });
        }

        let env = env.concrete(routine);
        let root = self
            .configured(env)
            .ok_or(Error::ConfigurationMissing {
                setting: env.setting(),
            })?;

        debug!(environment = %env, root = %root.display(), "Resolved environment root");
        Ok(ResolvedRoot {
            root: absolute(root),
            environment: env.as_str().to_string(),
            manual_override: false,
        })
    }
}

/// Make `path` absolute without requiring it to exist.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
