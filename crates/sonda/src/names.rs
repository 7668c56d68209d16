//! Routine name normalization.
//!
//! A user may type `U_PCMCTF43`, `pcmctf43.prw` or `PCMCTF43` for the same
//! routine, and the file on disk may be spelled any of those ways. This
//! module expands one typed name into the ordered list of filenames worth
//! probing. No I/O happens here.

use serde::Serialize;

use crate::error::{Error, Result};

/// Prefix the compiler adds to user-defined functions; marks a routine as custom.
pub const CUSTOM_PREFIX: &str = "U_";

/// Source file extensions recognized as routines, lower-case, without the dot.
pub const SOURCE_EXTENSIONS: [&str; 3] = ["prw", "prx", "prg"];

/// Returns `true` if `name` starts with [`CUSTOM_PREFIX`], ignoring case.
#[must_use]
pub fn has_custom_prefix(name: &str) -> bool {
    name.get(..CUSTOM_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(CUSTOM_PREFIX))
}

/// Remove [`CUSTOM_PREFIX`] from `name` if present, ignoring case.
#[must_use]
pub fn strip_custom_prefix(name: &str) -> &str {
    if has_custom_prefix(name) {
        &name[CUSTOM_PREFIX.len()..]
    } else {
        name
    }
}

/// Remove a recognized source extension from `name`, ignoring case.
#[must_use]
pub fn strip_source_extension(name: &str) -> &str {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if is_source_extension(ext) {
            return stem;
        }
    }
    name
}

/// Returns `true` if `ext` (without the dot) is one of [`SOURCE_EXTENSIONS`].
#[must_use]
pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// A routine name normalized into every spelling worth searching for.
///
/// Built once per request by [`RoutineName::parse`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineName {
    original: String,
    base: String,
    base_upper: String,
    with_prefix: String,
    without_prefix: String,
    variations: Vec<String>,
}

impl RoutineName {
    /// Normalize a user-typed routine name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is empty or only whitespace,
    /// if it contains path separators, a drive colon or `..`, or if nothing is
    /// left once the extension and custom prefix are stripped.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("routine name must be a non-empty string"));
        }
        if trimmed.contains(['/', '\\', ':', '\0']) || trimmed.contains("..") {
            return Err(Error::invalid_input(format!(
                "routine name '{trimmed}' must be a bare file name, not a path"
            )));
        }

        let base = strip_source_extension(trimmed);
        if base.is_empty() {
            return Err(Error::invalid_input(format!(
                "routine name '{trimmed}' has no name before its extension"
            )));
        }

        let without_prefix = strip_custom_prefix(base).to_string();
        if without_prefix.is_empty() {
            return Err(Error::invalid_input(format!(
                "routine name '{trimmed}' has nothing after the {CUSTOM_PREFIX} prefix"
            )));
        }
        let with_prefix = format!("{CUSTOM_PREFIX}{without_prefix}");
        let base_upper = base.to_uppercase();

        let mut variations: Vec<String> = Vec::new();
        for name in [
            base,
            base_upper.as_str(),
            with_prefix.as_str(),
            without_prefix.as_str(),
        ] {
            for candidate in std::iter::once(name.to_string()).chain(
                SOURCE_EXTENSIONS.iter().flat_map(|ext| {
                    [
                        format!("{name}.{ext}"),
                        format!("{name}.{}", ext.to_uppercase()),
                    ]
                }),
            ) {
                if !variations.contains(&candidate) {
                    variations.push(candidate);
                }
            }
        }

        Ok(Self {
            original: input.to_string(),
            base: base.to_string(),
            base_upper,
            with_prefix,
            without_prefix,
            variations,
        })
    }

    /// The input exactly as received.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The name with any source extension removed.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// [`base`](Self::base) upper-cased.
    #[must_use]
    pub fn base_upper(&self) -> &str {
        &self.base_upper
    }

    /// Canonical form carrying the custom prefix (`U_NAME`).
    #[must_use]
    pub fn with_prefix(&self) -> &str {
        &self.with_prefix
    }

    /// Canonical form without the custom prefix (`NAME`).
    #[must_use]
    pub fn without_prefix(&self) -> &str {
        &self.without_prefix
    }

    /// Whether the typed name carries the custom prefix.
    #[must_use]
    pub fn is_custom_prefixed(&self) -> bool {
        has_custom_prefix(&self.base)
    }

    /// Cache key used by the classifier: prefix-stripped and upper-cased.
    #[must_use]
    pub fn key(&self) -> String {
        self.without_prefix.to_uppercase()
    }

    /// Candidate filenames in search-priority order, without duplicates.
    #[must_use]
    pub fn variations(&self) -> &[String] {
        &self.variations
    }
}

impl std::fmt::Display for RoutineName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}
