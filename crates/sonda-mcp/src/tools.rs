//! MCP tool implementations.
//!
//! Lookups walk the filesystem, so each one runs on tokio's blocking pool
//! with its own clone of the shared [`Sonda`] handle.

use std::path::PathBuf;

use sonda::{Envelope, RoutineData, RoutineRequest, Sonda, TableRequest, TableUsage};
use tracing::debug;

use crate::error::Result;
use crate::models::{
    EnvironmentsResponse, FindRoutineParams, SearchTableParams, parse_action, parse_environment,
};

/// Tool implementations for the sonda MCP server.
pub struct Tools {
    sonda: Sonda,
}

impl Tools {
    /// Create a new Tools instance over `sonda`.
    pub fn new(sonda: Sonda) -> Self {
        Self { sonda }
    }

    /// Locate a routine and describe it.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid arguments, a malformed routine name or an
    /// unconfigured environment. A routine that is not found is a
    /// `success = false` envelope.
    pub async fn find_routine(&self, params: FindRoutineParams) -> Result<Envelope<RoutineData>> {
        let request = RoutineRequest {
            routine: params.routine,
            environment: parse_environment(params.environment.as_deref())?,
            root: params.root.map(PathBuf::from),
            action: parse_action(params.action.as_deref())?,
        };
        debug!(routine = %request.routine, action = ?request.action, "find_routine");

        let sonda = self.sonda.clone();
        let envelope = tokio::task::spawn_blocking(move || sonda.resolve_routine(&request)).await??;
        Ok(envelope)
    }

    /// List routines that use a table.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid arguments, a malformed table name, a zero
    /// row cap or an unconfigured environment.
    pub async fn search_table(&self, params: SearchTableParams) -> Result<Envelope<Vec<TableUsage>>> {
        let request = TableRequest {
            table: params.table,
            environment: parse_environment(params.environment.as_deref())?,
            root: params.root.map(PathBuf::from),
            include_standard: params.include_standard.unwrap_or(false),
            max_results: params.max_results,
        };
        debug!(table = %request.table, include_standard = request.include_standard, "search_table");

        let sonda = self.sonda.clone();
        let envelope = tokio::task::spawn_blocking(move || sonda.search_table(&request)).await??;
        Ok(envelope)
    }

    /// Show configured roots and classifier state.
    ///
    /// # Errors
    ///
    /// Returns an error only if the discovery task fails.
    pub async fn environments(&self, discover: bool) -> Result<EnvironmentsResponse> {
        if discover {
            let sonda = self.sonda.clone();
            tokio::task::spawn_blocking(move || sonda.discover()).await?;
        }

        Ok(EnvironmentsResponse {
            environments: self.sonda.environments(),
            classifier: self.sonda.classifier().stats(),
        })
    }
}
