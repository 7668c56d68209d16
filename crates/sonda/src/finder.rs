//! Locating a routine's source file under a root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::DEFAULT_ROUTINE_DEPTH;
use crate::error::ScanError;
use crate::indexer::FileIndexer;
use crate::names::RoutineName;

/// How a file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// `root/<variation>` existed.
    DirectProbe,
    /// Found by walking the tree and comparing basenames.
    Walk,
}

/// Result of a routine lookup. Not finding a routine is an outcome, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FindOutcome {
    /// The routine's file.
    Found {
        /// Absolute path of the file.
        path: PathBuf,
        /// How it was found.
        method: MatchMethod,
        /// Files visited by the walk (zero for a direct hit).
        files_scanned: usize,
    },
    /// Nothing matched.
    NotFound {
        /// The root that was searched.
        root: PathBuf,
        /// Every spelling that was tried, in priority order.
        variations: Vec<String>,
        /// Files visited by the walk.
        files_scanned: usize,
        /// Entries the walk had to skip.
        #[serde(skip)]
        skipped: Vec<ScanError>,
    },
}

impl FindOutcome {
    /// Path of the found file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found { path, .. } => Some(path),
            Self::NotFound { .. } => None,
        }
    }

    /// Number of files the walk visited.
    #[must_use]
    pub fn files_scanned(&self) -> usize {
        match self {
            Self::Found { files_scanned, .. } | Self::NotFound { files_scanned, .. } => {
                *files_scanned
            }
        }
    }
}

/// Finds the file behind a routine name.
#[derive(Debug, Clone)]
pub struct RoutineFinder {
    indexer: FileIndexer,
}

impl Default for RoutineFinder {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTINE_DEPTH)
    }
}

impl RoutineFinder {
    /// Create a finder whose fallback walk stops at `max_depth`.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            indexer: FileIndexer::for_sources().max_depth(max_depth),
        }
    }

    /// Look `name` up under `root`.
    ///
    /// Each variation is first probed directly at the root, in priority
    /// order. If none exists the tree is walked and basenames are compared
    /// ignoring case; the first file in walk order wins.
    #[must_use]
    pub fn find(&self, root: &Path, name: &RoutineName) -> FindOutcome {
        for variation in name.variations() {
            let candidate = root.join(variation);
            if candidate.is_file() {
                debug!(routine = %name, path = %candidate.display(), "Direct probe hit");
                return FindOutcome::Found {
                    path: candidate,
                    method: MatchMethod::DirectProbe,
                    files_scanned: 0,
                };
            }
        }

        let wanted: HashSet<String> = name
            .variations()
            .iter()
            .map(|v| v.to_uppercase())
            .collect();

        let scan = self.indexer.scan(root);
        let files_scanned = scan.files.len();
        let hit = scan.files.into_iter().find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| wanted.contains(&n.to_uppercase()))
        });

        match hit {
            Some(path) => {
                debug!(routine = %name, path = %path.display(), files_scanned, "Found routine by walk");
                FindOutcome::Found {
                    path,
                    method: MatchMethod::Walk,
                    files_scanned,
                }
            }
            None => {
                debug!(routine = %name, root = %root.display(), files_scanned, "Routine not found");
                FindOutcome::NotFound {
                    root: root.to_path_buf(),
                    variations: name.variations().to_vec(),
                    files_scanned,
                    skipped: scan.skipped,
                }
            }
        }
    }
}
