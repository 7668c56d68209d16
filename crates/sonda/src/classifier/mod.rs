//! Standard vs. custom routine classification.
//!
//! A routine is *standard* when it ships with the vendor and *custom* when
//! the customer wrote it. The decision comes from the ordered rules in
//! [`rules::RULES`]:
//!
//! 1. A custom-prefixed name (`U_`) is custom. Always, and before anything
//!    else, including the cache.
//! 2. A name starting with a known vendor prefix is standard. Known prefixes
//!    are the built-in table plus whatever discovery learned.
//! 3. If a file is available, its first lines are inspected for markers.
//! 4. A name shaped like four letters and three digits is standard.
//! 5. Anything else is custom.
//!
//! Decisions are memoized in a [`ClassificationCache`] owned by the
//! classifier. Share one classifier (behind an `Arc`) to share the cache.

mod cache;
mod discovery;
pub mod rules;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use cache::ClassificationCache;
pub use discovery::{DiscoveryGate, DiscoveryState};
use rules::{CONTENT_HEAD_LINES, RULES, RuleInput, inspect_content, matches_known_prefix};

use crate::config::DEFAULT_DISCOVERY_DEPTH;
use crate::error::Result;
use crate::indexer::FileIndexer;
use crate::names::{RoutineName, has_custom_prefix};
use crate::source::read_head;

/// Rule label reported for decisions served from the cache.
pub const CACHED_RULE: &str = "cache";
/// Rule label reported when a file could not be read for inspection.
pub const UNREADABLE_RULE: &str = "unreadable";

/// Who wrote a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineOrigin {
    /// Shipped by the vendor.
    Standard,
    /// Written by the customer.
    Custom,
}

impl RoutineOrigin {
    fn from_standard(standard: bool) -> Self {
        if standard { Self::Standard } else { Self::Custom }
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for RoutineOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// The verdict.
    pub origin: RoutineOrigin,
    /// Name of the rule that decided, or [`CACHED_RULE`] / [`UNREADABLE_RULE`].
    pub rule: &'static str,
    /// Whether the verdict came from the cache.
    pub cached: bool,
}

impl Classification {
    fn decided(standard: bool, rule: &'static str) -> Self {
        Self {
            origin: RoutineOrigin::from_standard(standard),
            rule,
            cached: false,
        }
    }

    /// Shorthand for `origin == Standard`.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.origin == RoutineOrigin::Standard
    }
}

/// Counters describing classifier activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierStats {
    /// Decisions currently memoized.
    pub cached_decisions: usize,
    /// Files opened for content inspection so far, discovery included.
    pub content_inspections: usize,
    /// Prefixes learned from the standard tree.
    pub discovered_prefixes: Vec<String>,
    /// Where the discovery pass stands.
    pub discovery: DiscoveryState,
}

/// Decides whether routines are standard or custom.
#[derive(Debug)]
pub struct RoutineClassifier {
    cache: ClassificationCache,
    discovered: RwLock<BTreeSet<String>>,
    gate: DiscoveryGate,
    standard_root: Option<PathBuf>,
    discovery_depth: usize,
    inspections: AtomicUsize,
}

impl Default for RoutineClassifier {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RoutineClassifier {
    /// Create a classifier. `standard_root` is walked once, on first need,
    /// to learn additional vendor prefixes.
    #[must_use]
    pub fn new(standard_root: Option<PathBuf>) -> Self {
        Self {
            cache: ClassificationCache::new(),
            discovered: RwLock::new(BTreeSet::new()),
            gate: DiscoveryGate::default(),
            standard_root,
            discovery_depth: DEFAULT_DISCOVERY_DEPTH,
            inspections: AtomicUsize::new(0),
        }
    }

    /// Set the walk depth of the discovery pass.
    #[must_use]
    pub fn discovery_depth(mut self, depth: usize) -> Self {
        self.discovery_depth = depth;
        self
    }

    /// Classify a user-typed routine name without a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if the name
    /// is empty or malformed.
    pub fn classify_name(&self, input: &str) -> Result<Classification> {
        let name = RoutineName::parse(input)?;
        Ok(self.classify(&name, None))
    }

    /// Classify a routine, optionally inspecting `file` for markers.
    ///
    /// File content is read lazily, only when the name-based rules are
    /// inconclusive. An unreadable file yields a custom verdict that is
    /// logged and not cached.
    pub fn classify(&self, name: &RoutineName, file: Option<&Path>) -> Classification {
        if name.is_custom_prefixed() {
            return Classification::decided(false, RULES[0].name);
        }

        let key = name.key();
        if let Some(standard) = self.cache.get(&key) {
            return Classification {
                origin: RoutineOrigin::from_standard(standard),
                rule: CACHED_RULE,
                cached: true,
            };
        }

        self.ensure_discovered();

        let discovered = self.discovered.read();
        let mut content: Option<String> = None;
        let mut loaded = false;

        for rule in &RULES {
            if rule.needs_content && !loaded {
                loaded = true;
                if let Some(path) = file {
                    match self.inspect(path) {
                        Ok(head) => content = Some(head),
                        Err(e) => {
                            warn!(
                                routine = %name,
                                path = %path.display(),
                                error = %e,
                                "Cannot inspect routine file, treating as custom"
                            );
                            return Classification::decided(false, UNREADABLE_RULE);
                        }
                    }
                }
            }

            let input = RuleInput {
                custom_prefixed: false,
                key: &key,
                content: content.as_deref(),
                discovered: &discovered,
            };
            if let Some(standard) = (rule.eval)(&input) {
                let standard = self.cache.insert(key, standard);
                debug!(routine = %name, rule = rule.name, standard, "Classified routine");
                return Classification::decided(standard, rule.name);
            }
        }

        // The last rule always decides.
        Classification::decided(false, RULES[RULES.len() - 1].name)
    }

    /// Run prefix discovery now if it has not run yet.
    ///
    /// Returns `true` if this call performed the walk.
    pub fn discover(&self) -> bool {
        self.ensure_discovered()
    }

    /// Forget every memoized decision. Discovered prefixes are kept.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Files opened for content inspection so far.
    #[must_use]
    pub fn content_inspections(&self) -> usize {
        self.inspections.load(Ordering::Relaxed)
    }

    /// Prefixes learned from the standard tree, sorted.
    #[must_use]
    pub fn discovered_prefixes(&self) -> Vec<String> {
        self.discovered.read().iter().cloned().collect()
    }

    /// Snapshot of classifier activity.
    #[must_use]
    pub fn stats(&self) -> ClassifierStats {
        ClassifierStats {
            cached_decisions: self.cache.len(),
            content_inspections: self.content_inspections(),
            discovered_prefixes: self.discovered_prefixes(),
            discovery: self.gate.state(),
        }
    }

    fn ensure_discovered(&self) -> bool {
        self.gate.run_once(|| self.discover_prefixes())
    }

    fn inspect(&self, path: &Path) -> std::io::Result<String> {
        self.inspections.fetch_add(1, Ordering::Relaxed);
        read_head(path, CONTENT_HEAD_LINES).map(|head| head.to_uppercase())
    }

    fn discover_prefixes(&self) {
        let Some(root) = self.standard_root.as_deref() else {
            debug!("No standard root configured, skipping prefix discovery");
            return;
        };

        let scan = FileIndexer::for_sources()
            .max_depth(self.discovery_depth)
            .scan(root);

        let mut found = BTreeSet::new();
        for path in &scan.files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if has_custom_prefix(stem) {
                continue;
            }
            let Some(prefix) = leading_prefix(stem) else {
                continue;
            };
            if found.contains(&prefix) || matches_known_prefix(&prefix, &BTreeSet::new()) {
                continue;
            }

            match self.inspect(path) {
                Ok(head) if inspect_content(&head).is_standard() => {
                    found.insert(prefix);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read file during prefix discovery");
                }
            }
        }

        info!(
            root = %root.display(),
            files = scan.files.len(),
            prefixes = found.len(),
            "Standard prefix discovery completed"
        );
        self.discovered.write().extend(found);
    }
}

/// Leading letters of a filename stem used as a module prefix: the first
/// four letters, or three when only three lead the name.
fn leading_prefix(stem: &str) -> Option<String> {
    let letters: String = stem
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .take(4)
        .collect();
    (letters.len() >= 3).then(|| letters.to_ascii_uppercase())
}
