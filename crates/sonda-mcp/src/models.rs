//! MCP request parameters and response models.
//!
//! Parameter structs derive `JsonSchema` so the tool schemas advertised to
//! clients are generated from the same types the server deserializes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sonda::{ClassifierStats, Environment, EnvironmentInfo, RoutineAction};

use crate::error::{Error, Result};

/// Parameters for the `find_routine` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FindRoutineParams {
    /// Routine name as typed, e.g. `U_PCMCTF43`, `pcmctf43.prw` or `MATA010`.
    pub routine: String,

    /// Environment: staging (hml), production (prod, prd), standard (vendor, padrao)
    /// or auto. Auto picks staging for `U_` routines and standard otherwise.
    #[serde(default)]
    pub environment: Option<String>,

    /// Directory to search instead of the environment's configured root.
    #[serde(default)]
    pub root: Option<String>,

    /// What to return: locate (default), structure, report, source or git_status.
    #[serde(default)]
    pub action: Option<String>,
}

/// Parameters for the `search_table` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchTableParams {
    /// Table alias, e.g. `SA1` or `PD3`.
    pub table: String,

    /// Environment, as for `find_routine`. Auto searches staging.
    #[serde(default)]
    pub environment: Option<String>,

    /// Directory to search instead of the environment's configured root.
    #[serde(default)]
    pub root: Option<String>,

    /// Include vendor-standard routines (default false).
    #[serde(default)]
    pub include_standard: Option<bool>,

    /// Maximum number of routines to return (default from configuration, 50).
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Parameters for the `environments` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EnvironmentsParams {
    /// Run standard-prefix discovery now if it has not run yet.
    #[serde(default)]
    pub discover: bool,
}

/// Response from the `environments` tool.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentsResponse {
    /// Configured roots per environment.
    pub environments: Vec<EnvironmentInfo>,

    /// Classification cache and discovery state.
    pub classifier: ClassifierStats,
}

/// Parse an optional environment token. Missing means auto.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for unknown tokens.
pub fn parse_environment(value: Option<&str>) -> Result<Environment> {
    let value = value.unwrap_or_default();
    Environment::parse(value).map_err(|_| Error::InvalidArgument {
        field: "environment",
        value: value.to_string(),
        valid_values: Environment::VALID_TOKENS,
    })
}

/// Parse an optional action token. Missing means locate.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for unknown actions.
pub fn parse_action(value: Option<&str>) -> Result<RoutineAction> {
    let value = value.unwrap_or_default();
    RoutineAction::parse(value).map_err(|_| Error::InvalidArgument {
        field: "action",
        value: value.to_string(),
        valid_values: RoutineAction::VALID_TOKENS,
    })
}
