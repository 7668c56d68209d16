//! # Sonda: Routine and Table Locator for Protheus Source Trees
//!
//! Sonda finds ADVPL routines in large, unindexed source trees from nothing
//! but a typed name, tells vendor ("standard") routines apart from customer
//! ("custom") ones, and lists every routine that touches a given data table.
//!
//! ## Design Philosophy
//!
//! - **Filesystem is the index** - every request walks the tree again; nothing persists
//! - **Heuristics, not parsing** - filename conventions, prefix tables, lexical markers
//! - **Misses are data** - a routine that is not found is a reportable outcome, not an error
//! - **Library first, CLI second** - the `sonda` binary and the MCP server are thin shells
//!
//! ## Quick Start
//!
//! ```no_run
//! use sonda::{RoutineRequest, Sonda, SondaConfig, TableRequest};
//!
//! let sonda = Sonda::new(SondaConfig::discover(None)?);
//!
//! let routine = sonda.resolve_routine(&RoutineRequest::new("U_PCMCTF43"))?;
//! if let Some(data) = routine.data {
//!     println!("found at {}", data.path.display());
//! }
//!
//! let usage = sonda.search_table(&TableRequest::new("PD3"))?;
//! println!("{} routines use PD3", usage.data.map_or(0, |rows| rows.len()));
//! # Ok::<(), sonda::Error>(())
//! ```

pub mod classifier;
mod config;
mod envelope;
mod error;
mod finder;
pub mod git;
mod indexer;
mod locator;
mod names;
pub mod report;
mod source;
pub mod structure;
pub mod table_usage;

pub use classifier::{Classification, ClassifierStats, RoutineClassifier, RoutineOrigin};
pub use config::{
    CONFIG_PATH_VAR, MAX_RESULTS_VAR, PRODUCTION_ROOT_VAR, RootsConfig, STAGING_ROOT_VAR,
    STANDARD_ROOT_VAR, SearchConfig, SondaConfig,
};
pub use envelope::{
    Diagnostics, EnvironmentInfo, Envelope, Metadata, RoutineAction, RoutineData, RoutineRequest,
    TableRequest,
};
pub use error::{Error, Result, ScanError, ScanErrorKind};
pub use finder::{FindOutcome, MatchMethod, RoutineFinder};
pub use indexer::{FileIndexer, Scan};
pub use locator::{Environment, RepositoryLocator, ResolvedRoot};
pub use names::{CUSTOM_PREFIX, RoutineName, SOURCE_EXTENSIONS};
pub use source::{decode, read_source};
pub use table_usage::{TableSearchOptions, TableUsage, TableUsageAnalyzer, UsageCategory};

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use table_usage::TablePatterns;

/// Entry point tying the components together.
///
/// Holds the effective configuration and one shared [`RoutineClassifier`].
/// Cloning is cheap and clones share the classifier's cache.
#[derive(Debug, Clone)]
pub struct Sonda {
    config: SondaConfig,
    classifier: Arc<RoutineClassifier>,
}

impl Sonda {
    /// Create an instance with a fresh classifier built from `config`.
    #[must_use]
    pub fn new(config: SondaConfig) -> Self {
        let classifier = RoutineClassifier::new(config.roots.standard.clone())
            .discovery_depth(config.search.discovery_depth);
        Self::with_classifier(config, Arc::new(classifier))
    }

    /// Create an instance sharing an existing classifier.
    #[must_use]
    pub fn with_classifier(config: SondaConfig, classifier: Arc<RoutineClassifier>) -> Self {
        Self { config, classifier }
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &SondaConfig {
        &self.config
    }

    /// The shared classifier.
    #[must_use]
    pub fn classifier(&self) -> &Arc<RoutineClassifier> {
        &self.classifier
    }

    /// Run the standard-prefix discovery pass now instead of on first need.
    ///
    /// Returns `true` if this call performed the walk.
    pub fn discover(&self) -> bool {
        self.classifier.discover()
    }

    /// Configured roots per concrete environment.
    #[must_use]
    pub fn environments(&self) -> Vec<EnvironmentInfo> {
        let locator = RepositoryLocator::new(&self.config.roots);
        [Environment::Staging, Environment::Production, Environment::Standard]
            .into_iter()
            .map(|environment| {
                let root = locator.configured(environment).map(Path::to_path_buf);
                EnvironmentInfo {
                    environment,
                    setting: environment.setting(),
                    exists: root.as_deref().is_some_and(Path::is_dir),
                    root,
                }
            })
            .collect()
    }

    /// Locate a routine and describe it according to `request.action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed routine name and
    /// [`Error::ConfigurationMissing`] if the environment has no root. A
    /// routine that cannot be found is a `success = false` envelope. Failing
    /// to read the found file for `structure`, `report` or `source` is
    /// [`Error::Io`].
    pub fn resolve_routine(&self, request: &RoutineRequest) -> Result<Envelope<RoutineData>> {
        let name = RoutineName::parse(&request.routine)?;
        let resolved = RepositoryLocator::new(&self.config.roots).resolve(
            request.environment,
            Some(&name),
            request.root.as_deref(),
        )?;

        let mut metadata = Metadata::for_root(&resolved);
        metadata.routine = Some(name.base().to_string());

        let outcome = RoutineFinder::new(self.config.search.routine_depth).find(&resolved.root, &name);
        let path = match outcome {
            FindOutcome::Found { path, .. } => path,
            FindOutcome::NotFound {
                root,
                variations,
                files_scanned,
                skipped,
            } => {
                info!(routine = %name, root = %root.display(), "Routine not found");
                return Ok(Envelope::not_found(
                    format!(
                        "Routine {name} not found under {} ({})",
                        root.display(),
                        resolved.environment
                    ),
                    metadata,
                    Diagnostics {
                        searched_root: root,
                        attempted_variations: variations,
                        files_scanned,
                        skipped: skipped.iter().map(ToString::to_string).collect(),
                    },
                ));
            }
        };

        let classification = self.classifier.classify(&name, Some(&path));
        metadata.classification = Some(classification.origin);
        metadata.classification_rule = Some(classification.rule);

        let mut data = RoutineData {
            routine: name.base().to_string(),
            path,
            action: request.action,
            structure: None,
            report: None,
            source: None,
            git: None,
        };

        match request.action {
            RoutineAction::Locate => {}
            RoutineAction::Structure => {
                data.structure = Some(structure::analyze(&read_source(&data.path)?));
            }
            RoutineAction::Report => {
                let outline = structure::analyze(&read_source(&data.path)?);
                let mut text = String::new();
                report::write_report(
                    &mut text,
                    &report::ReportInput {
                        routine: name.base(),
                        path: &data.path,
                        origin: classification.origin,
                        environment: &resolved.environment,
                        structure: &outline,
                        generated_at: Utc::now(),
                    },
                )?;
                data.report = Some(text);
                data.structure = Some(outline);
            }
            RoutineAction::Source => {
                data.source = Some(read_source(&data.path)?);
            }
            RoutineAction::GitStatus => {
                data.git = Some(git::status(&data.path));
            }
        }

        debug!(routine = %name, path = %data.path.display(), origin = %classification.origin, "Routine resolved");
        let message = format!("Found {name} ({}) at {}", classification.origin, data.path.display());
        Ok(Envelope::found(data, message, metadata))
    }

    /// List routines that reference `request.table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed table name or a zero
    /// row cap and [`Error::ConfigurationMissing`] if the environment has no
    /// root. No matching routine is a `success = false` envelope.
    pub fn search_table(&self, request: &TableRequest) -> Result<Envelope<Vec<TableUsage>>> {
        let patterns = TablePatterns::new(&request.table)?;
        let resolved = RepositoryLocator::new(&self.config.roots).resolve(
            request.environment,
            None,
            request.root.as_deref(),
        )?;

        let options = TableSearchOptions {
            include_standard: request.include_standard,
            max_results: request.max_results.unwrap_or(self.config.search.max_results),
        };
        let search = TableUsageAnalyzer::new(Arc::clone(&self.classifier))
            .max_depth(self.config.search.table_depth)
            .search_with(&resolved.root, &patterns, options)?;

        let mut metadata = Metadata::for_root(&resolved);
        metadata.table = Some(search.table.clone());
        metadata.summary = Some(search.summary.clone());
        metadata.limit_reached = Some(search.limit_reached);
        metadata.standard_excluded = Some(search.standard_excluded);

        if search.rows.is_empty() {
            let message = if search.standard_excluded > 0 {
                format!(
                    "No custom routines reference table {} ({} standard routines excluded)",
                    search.table, search.standard_excluded
                )
            } else {
                format!("No routines reference table {}", search.table)
            };
            return Ok(Envelope::not_found(
                message,
                metadata,
                Diagnostics {
                    searched_root: resolved.root,
                    attempted_variations: Vec::new(),
                    files_scanned: search.files_scanned,
                    skipped: search.skipped.iter().map(ToString::to_string).collect(),
                },
            ));
        }

        let message = format!(
            "{} routines reference table {} ({} files scanned)",
            search.rows.len(),
            search.table,
            search.files_scanned
        );
        Ok(Envelope::found(search.rows, message, metadata))
    }
}
