//! Bounded-depth discovery of source files.
//!
//! Every search walks the tree again; nothing is cached between calls.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ScanError, ScanErrorKind};
use crate::names::SOURCE_EXTENSIONS;

/// Directory names never descended into, compared ignoring case.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".vscode",
    "build",
    "bin",
    "obj",
    "out",
    "dist",
    "backup",
    "backups",
    "bkp",
    "old",
    "__pycache__",
    "node_modules",
];

/// Result of one walk.
#[derive(Debug, Default)]
pub struct Scan {
    /// Absolute paths of matching files.
    pub files: Vec<PathBuf>,
    /// Directories or entries that could not be read and were skipped.
    pub skipped: Vec<ScanError>,
}

/// Recursive file walker filtered by extension.
///
/// Depth counts directory levels: files directly under the root are at
/// depth 1, files one directory down at depth 2, and so on. Anything deeper
/// than `max_depth` is silently invisible to the walk.
#[derive(Debug, Clone)]
pub struct FileIndexer {
    extensions: Vec<String>,
    max_depth: usize,
}

impl Default for FileIndexer {
    fn default() -> Self {
        Self::for_sources()
    }
}

impl FileIndexer {
    /// Depth used when no explicit limit is set.
    pub const DEFAULT_MAX_DEPTH: usize = 10;

    /// Create an indexer for the given extensions (without dots, any case).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Create an indexer for the recognized ADVPL source extensions.
    #[must_use]
    pub fn for_sources() -> Self {
        Self::new(SOURCE_EXTENSIONS)
    }

    /// Set the maximum walk depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk `root` and collect matching files.
    ///
    /// Unreadable directories are logged and skipped; the walk never fails.
    #[must_use]
    pub fn scan(&self, root: &Path) -> Scan {
        let mut scan = Scan::default();

        let walker = WalkDir::new(root)
            .max_depth(self.max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Cannot read directory entry, skipping"
                    );
                    scan.skipped
                        .push(ScanError::new(path, ScanErrorKind::WalkError, e.to_string()));
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                scan.files.push(entry.into_path());
            }
        }

        debug!(
            root = %root.display(),
            files = scan.files.len(),
            skipped = scan.skipped.len(),
            max_depth = self.max_depth,
            "Walk completed"
        );
        scan
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }
}

/// Check if a walk entry is a directory that should be pruned.
fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            IGNORED_DIRS
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(name))
        })
}
