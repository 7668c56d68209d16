//! Which routines touch a data table, and how.
//!
//! Every source file under a root is read, matched against reference
//! patterns for the table and, when it references it, assigned a
//! [`UsageCategory`] from lexical evidence. Matching is done on upper-cased
//! content; ADVPL is case-insensitive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::{RoutineClassifier, RoutineOrigin};
use crate::config::{DEFAULT_MAX_RESULTS, DEFAULT_TABLE_DEPTH};
use crate::error::{Error, Result, ScanError};
use crate::indexer::FileIndexer;
use crate::names::RoutineName;
use crate::source::read_source;

static BROWSE: LazyLock<Regex> = LazyLock::new(|| {
    keywords(&[
        "MBROWSE",
        "FWMBROWSE",
        "FWMARKBROWSE",
        "FWBROWSE",
        "MARKBROW",
        "AXCADASTRO",
        "FWFORMBROWSE",
    ])
});

static QUERY: LazyLock<Regex> = LazyLock::new(|| {
    keywords(&[
        "TCQUERY",
        "TCGENQRY",
        "BEGINSQL",
        "MPSYSOPENQUERY",
        "TCSQLEXEC",
        "FWEXECSTATEMENT",
        "SELECT",
    ])
});

static REPORT: LazyLock<Regex> = LazyLock::new(|| {
    keywords(&["TREPORT", "SETPRINT", "RPTSTATUS", "FWMSPRINTER", "TMSPRINTER"])
});

static INTEGRATION: LazyLock<Regex> = LazyLock::new(|| {
    keywords(&[
        "WSRESTFUL",
        "WSSERVICE",
        "WSMETHOD",
        "WSCLIENT",
        "HTTPPOST",
        "HTTPGET",
        "HTTPSPOST",
        "FWREST",
    ])
});

static USER_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*USER[ \t]+FUNCTION[ \t]+(\w+)").expect("valid regex")
});

static STATIC_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*STATIC[ \t]+FUNC(?:TION)?[ \t]+(\w+)").expect("valid regex")
});

fn keywords(words: &[&str]) -> Regex {
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("valid regex")
}

/// How a routine uses a table, in display priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageCategory {
    /// Opens a browse screen.
    Browse,
    /// Locks records for insert, update or delete.
    Crud,
    /// Runs SQL.
    Query,
    /// Prints a report.
    Report,
    /// Exposes or calls a web service.
    Integration,
    /// References the table with no stronger evidence.
    Other,
}

impl UsageCategory {
    /// Every category, highest priority first.
    pub const ALL: [Self; 6] = [
        Self::Browse,
        Self::Crud,
        Self::Query,
        Self::Report,
        Self::Integration,
        Self::Other,
    ];

    /// Sort rank, 1 (browse) to 6 (other).
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Browse => 1,
            Self::Crud => 2,
            Self::Query => 3,
            Self::Report => 4,
            Self::Integration => 5,
            Self::Other => 6,
        }
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Crud => "crud",
            Self::Query => "query",
            Self::Report => "report",
            Self::Integration => "integration",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical evidence of what a file does with the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct UsageFlags {
    /// Opens a browse screen (not table-specific).
    pub has_browse: bool,
    /// `RecLock("T", .T.)`.
    pub has_insert: bool,
    /// `RecLock("T", .F.)`.
    pub has_update: bool,
    /// `T->(DbDelete())`, or `DbDelete()` shortly after `RecLock("T", .F.)`.
    pub has_delete: bool,
}

impl UsageFlags {
    /// Any record-level write.
    #[must_use]
    pub fn is_crud(&self) -> bool {
        self.has_insert || self.has_update || self.has_delete
    }
}

/// What a category predicate sees.
struct Evidence<'a> {
    upper: &'a str,
    flags: UsageFlags,
}

type CategoryPredicate = fn(&Evidence<'_>) -> bool;

/// Category assignment, first matching predicate wins; [`UsageCategory::Other`] otherwise.
const CATEGORY_RULES: [(CategoryPredicate, UsageCategory); 5] = [
    (|e| e.flags.has_browse, UsageCategory::Browse),
    (|e| e.flags.is_crud(), UsageCategory::Crud),
    (|e| QUERY.is_match(e.upper), UsageCategory::Query),
    (|e| REPORT.is_match(e.upper), UsageCategory::Report),
    (|e| INTEGRATION.is_match(e.upper), UsageCategory::Integration),
];

/// Pick the category for upper-cased content with the given flags.
#[must_use]
pub fn categorize(upper: &str, flags: UsageFlags) -> UsageCategory {
    let evidence = Evidence { upper, flags };
    CATEGORY_RULES
        .iter()
        .find(|(applies, _)| applies(&evidence))
        .map_or(UsageCategory::Other, |(_, category)| *category)
}

/// Table-specific patterns, compiled once per search.
#[derive(Debug, Clone)]
pub struct TablePatterns {
    table: String,
    word: Regex,
    references: Vec<Regex>,
    insert: Regex,
    update: Regex,
    delete: Vec<Regex>,
}

impl TablePatterns {
    /// Compile the patterns for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `table` is blank or contains
    /// anything other than letters, digits and underscores.
    pub fn new(table: &str) -> Result<Self> {
        let table = table.trim().to_uppercase();
        if table.is_empty() {
            return Err(Error::invalid_input("table name must be a non-empty string"));
        }
        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_input(format!(
                "table name '{table}' may only contain letters, digits and underscores"
            )));
        }

        let t = regex::escape(&table);
        let compile = |pattern: String| Regex::new(&pattern).map_err(|e| Error::invalid_input(e.to_string()));
        let lock = format!(r#"RECLOCK\s*\(\s*["']{t}["']\s*,\s*"#);

        Ok(Self {
            word: compile(format!(r"\b{t}\b"))?,
            references: vec![
                compile(format!(r"\b{t}\b"))?,
                compile(format!(r#"DBSELECTAREA\s*\(\s*["']{t}["']\s*\)"#))?,
                compile(format!(r#"\(\s*["']{t}["']\s*\)"#))?,
                compile(format!(r"\b{t}\s*->"))?,
            ],
            insert: compile(format!(r"{lock}\.T\."))?,
            update: compile(format!(r"{lock}\.F\."))?,
            delete: vec![
                compile(format!(r"\b{t}\s*->\s*\(\s*DBDELETE\s*\("))?,
                compile(format!(r"(?s){lock}\.F\.\s*\).{{0,400}}?DBDELETE\s*\("))?,
            ],
            table,
        })
    }

    /// The normalized (upper-cased) table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether upper-cased content references the table.
    #[must_use]
    pub fn is_referenced(&self, upper: &str) -> bool {
        self.references.iter().any(|re| re.is_match(upper))
    }

    /// Number of whole-word occurrences of the table name.
    #[must_use]
    pub fn occurrences(&self, upper: &str) -> usize {
        self.word.find_iter(upper).count()
    }

    /// Collect usage flags from upper-cased content.
    #[must_use]
    pub fn flags(&self, upper: &str) -> UsageFlags {
        UsageFlags {
            has_browse: BROWSE.is_match(upper),
            has_insert: self.insert.is_match(upper),
            has_update: self.update.is_match(upper),
            has_delete: self.delete.iter().any(|re| re.is_match(upper)),
        }
    }
}

/// Whether `content` (any case) references `table`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a malformed table name.
pub fn has_table_reference(content: &str, table: &str) -> Result<bool> {
    Ok(TablePatterns::new(table)?.is_referenced(&content.to_uppercase()))
}

/// Declared functions in a file: `(user, static)`, case preserved, first
/// declaration order, without duplicates.
#[must_use]
pub fn extract_functions(content: &str) -> (Vec<String>, Vec<String>) {
    (
        captures(&USER_FUNCTION, content),
        captures(&STATIC_FUNCTION, content),
    )
}

fn captures(re: &Regex, content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in re.captures_iter(content).filter_map(|c| c.get(1)) {
        if !names.iter().any(|n| n == name.as_str()) {
            names.push(name.as_str().to_string());
        }
    }
    names
}

/// One routine that uses the table.
#[derive(Debug, Clone, Serialize)]
pub struct TableUsage {
    /// Routine name (file stem).
    pub routine: String,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Strongest usage category found.
    pub category: UsageCategory,
    /// Whole-word occurrences of the table name.
    pub occurrences: usize,
    /// Evidence behind the category.
    #[serde(flatten)]
    pub flags: UsageFlags,
    /// Standard or custom.
    pub origin: RoutineOrigin,
    /// `User Function` declarations.
    pub user_functions: Vec<String>,
    /// `Static Function` declarations.
    pub static_functions: Vec<String>,
}

/// Knobs for one table search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSearchOptions {
    /// Keep rows for standard routines.
    pub include_standard: bool,
    /// Stop collecting after this many rows.
    pub max_results: usize,
}

impl Default for TableSearchOptions {
    fn default() -> Self {
        Self {
            include_standard: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Outcome of a table search.
#[derive(Debug, Clone, Serialize)]
pub struct TableSearch {
    /// Upper-cased table name.
    pub table: String,
    /// Matching routines, strongest category first, then most occurrences.
    pub rows: Vec<TableUsage>,
    /// Row count per category.
    pub summary: BTreeMap<UsageCategory, usize>,
    /// Files found by the walk.
    pub files_indexed: usize,
    /// Files actually read.
    pub files_scanned: usize,
    /// Standard routines left out.
    pub standard_excluded: usize,
    /// Whether collection stopped at `max_results` with files left unread.
    pub limit_reached: bool,
    /// Files and directories that could not be read.
    #[serde(skip)]
    pub skipped: Vec<ScanError>,
}

/// Searches a tree for routines referencing a table.
#[derive(Debug, Clone)]
pub struct TableUsageAnalyzer {
    classifier: Arc<RoutineClassifier>,
    indexer: FileIndexer,
}

impl TableUsageAnalyzer {
    /// Create an analyzer sharing `classifier`'s cache.
    #[must_use]
    pub fn new(classifier: Arc<RoutineClassifier>) -> Self {
        Self {
            classifier,
            indexer: FileIndexer::for_sources().max_depth(DEFAULT_TABLE_DEPTH),
        }
    }

    /// Set the walk depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.indexer = self.indexer.max_depth(depth);
        self
    }

    /// Find routines under `root` that reference `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed table name or a zero
    /// `max_results`. Unreadable files are skipped, never fatal.
    pub fn search(&self, root: &Path, table: &str, options: TableSearchOptions) -> Result<TableSearch> {
        self.search_with(root, &TablePatterns::new(table)?, options)
    }

    /// Like [`search`](Self::search) with already compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `max_results` is zero.
    pub fn search_with(
        &self,
        root: &Path,
        patterns: &TablePatterns,
        options: TableSearchOptions,
    ) -> Result<TableSearch> {
        if options.max_results == 0 {
            return Err(Error::invalid_input("max_results must be at least 1"));
        }

        let scan = self.indexer.scan(root);
        let mut search = TableSearch {
            table: patterns.table().to_string(),
            rows: Vec::new(),
            summary: BTreeMap::new(),
            files_indexed: scan.files.len(),
            files_scanned: 0,
            standard_excluded: 0,
            limit_reached: false,
            skipped: scan.skipped,
        };

        for path in &scan.files {
            if search.rows.len() >= options.max_results {
                search.limit_reached = true;
                break;
            }

            let content = match read_source(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read source file, skipping");
                    search.skipped.push(ScanError::io_error(path.clone(), &e));
                    continue;
                }
            };
            search.files_scanned += 1;

            let upper = content.to_uppercase();
            if !patterns.is_referenced(&upper) {
                continue;
            }

            let Some(name) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| RoutineName::parse(s).ok())
            else {
                continue;
            };
            let classification = self.classifier.classify(&name, Some(path));
            if classification.is_standard() && !options.include_standard {
                search.standard_excluded += 1;
                continue;
            }

            let flags = patterns.flags(&upper);
            let (user_functions, static_functions) = extract_functions(&content);
            search.rows.push(TableUsage {
                routine: name.base().to_string(),
                path: path.clone(),
                category: categorize(&upper, flags),
                occurrences: patterns.occurrences(&upper),
                flags,
                origin: classification.origin,
                user_functions,
                static_functions,
            });
        }

        search.rows.sort_by(|a, b| {
            a.category
                .rank()
                .cmp(&b.category.rank())
                .then_with(|| b.occurrences.cmp(&a.occurrences))
        });
        for row in &search.rows {
            *search.summary.entry(row.category).or_insert(0) += 1;
        }

        debug!(skipped = search.skipped.len(), "Table search skipped entries");
        info!(
            table = %search.table,
            root = %root.display(),
            rows = search.rows.len(),
            files_scanned = search.files_scanned,
            limit_reached = search.limit_reached,
            "Table search completed"
        );
        Ok(search)
    }
}
