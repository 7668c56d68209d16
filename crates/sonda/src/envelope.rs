//! Request and result types shared by the CLI and the MCP server.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::RoutineOrigin;
use crate::error::{Error, Result};
use crate::git::GitStatus;
use crate::locator::{Environment, ResolvedRoot};
use crate::structure::RoutineStructure;
use crate::table_usage::UsageCategory;

/// Uniform result of every operation.
///
/// Negative outcomes (`success = false`) always carry [`Diagnostics`].
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    /// Whether the operation found what it was asked for.
    pub success: bool,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// What was resolved on the way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Why nothing was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl<T> Envelope<T> {
    /// A successful result.
    pub fn found(data: T, message: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            metadata: Some(metadata),
            diagnostics: None,
        }
    }

    /// A negative result with the context needed to explain it.
    pub fn not_found(message: impl Into<String>, metadata: Metadata, diagnostics: Diagnostics) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            metadata: Some(metadata),
            diagnostics: Some(diagnostics),
        }
    }
}

/// Resolution context of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Environment label (`staging`, `production`, `standard`, `manual`).
    pub environment: String,
    /// Root that was searched.
    pub root: PathBuf,
    /// Whether the caller supplied the root.
    pub manual_override: bool,
    /// Normalized routine name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine: Option<String>,
    /// Normalized table name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Standard or custom, for a located routine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<RoutineOrigin>,
    /// Rule that produced the classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_rule: Option<&'static str>,
    /// Rows per usage category, for table searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BTreeMap<UsageCategory, usize>>,
    /// Whether a table search stopped at its row cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_reached: Option<bool>,
    /// Standard routines left out of a table search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_excluded: Option<usize>,
}

impl Metadata {
    /// Metadata seeded from a resolved root.
    #[must_use]
    pub fn for_root(resolved: &ResolvedRoot) -> Self {
        Self {
            environment: resolved.environment.clone(),
            root: resolved.root.clone(),
            manual_override: resolved.manual_override,
            ..Self::default()
        }
    }
}

/// Context attached to negative outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Root that was searched.
    pub searched_root: PathBuf,
    /// Filenames tried, in priority order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempted_variations: Vec<String>,
    /// Files visited.
    pub files_scanned: usize,
    /// Files or directories that could not be read.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

/// What to do with a located routine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineAction {
    /// Path and classification only.
    #[default]
    Locate,
    /// Lexical outline.
    Structure,
    /// Markdown report with a flowchart.
    Report,
    /// Full source text.
    Source,
    /// Git branch, status and last commit.
    GitStatus,
}

impl RoutineAction {
    /// Accepted spellings, for error messages.
    pub const VALID_TOKENS: &'static str = "locate, structure, report, source, git_status";

    /// Parse an action token, ignoring case. Empty means [`RoutineAction::Locate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown actions.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().replace('-', "_").as_str() {
            "" | "locate" => Ok(Self::Locate),
            "structure" => Ok(Self::Structure),
            "report" => Ok(Self::Report),
            "source" => Ok(Self::Source),
            "git_status" | "git" => Ok(Self::GitStatus),
            other => Err(Error::invalid_input(format!(
                "unknown action '{other}'. Valid values: {}",
                Self::VALID_TOKENS
            ))),
        }
    }
}

impl FromStr for RoutineAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Locate one routine and describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRequest {
    /// Routine name as typed.
    pub routine: String,
    /// Environment to search.
    pub environment: Environment,
    /// Explicit root overriding the environment.
    pub root: Option<PathBuf>,
    /// What to return about the routine.
    pub action: RoutineAction,
}

impl RoutineRequest {
    /// Locate `routine` in the auto-detected environment.
    pub fn new(routine: impl Into<String>) -> Self {
        Self {
            routine: routine.into(),
            environment: Environment::Auto,
            root: None,
            action: RoutineAction::Locate,
        }
    }
}

/// Find every routine that uses a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    /// Table name as typed.
    pub table: String,
    /// Environment to search.
    pub environment: Environment,
    /// Explicit root overriding the environment.
    pub root: Option<PathBuf>,
    /// Keep standard routines in the results.
    pub include_standard: bool,
    /// Row cap; the configured default when `None`.
    pub max_results: Option<usize>,
}

impl TableRequest {
    /// Search `table` in the auto-detected environment with default limits.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            environment: Environment::Auto,
            root: None,
            include_standard: false,
            max_results: None,
        }
    }
}

/// Payload of a routine request.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineData {
    /// Routine name as normalized.
    pub routine: String,
    /// Absolute path of its file.
    pub path: PathBuf,
    /// Action that produced this payload.
    pub action: RoutineAction,
    /// Outline, for `structure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<RoutineStructure>,
    /// Markdown, for `report`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Source text, for `source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Git facts, for `git_status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitStatus>,
}

/// One configured environment root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    /// The environment.
    pub environment: Environment,
    /// Setting that configures it.
    pub setting: &'static str,
    /// Configured root, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Whether the configured root is an existing directory.
    pub exists: bool,
}
