//! Ordered classification rules.
//!
//! Each rule is a pure function from a [`RuleInput`] to an optional verdict
//! (`Some(true)` = standard, `Some(false)` = custom). Rules are evaluated in
//! [`RULES`] order and the first `Some` wins, so precedence is data and each
//! rule can be tested on its own.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Naming prefixes of vendor routines, one per Protheus module family.
pub const BUILTIN_PREFIXES: &[&str] = &[
    // Materials, purchasing, inventory
    "MATA", "MATR", "MATC", "COMA", "ESTA",
    // Finance and accounting
    "FINA", "FINR", "FINC", "CTBA", "CTBR", "CTBC", "ATFA", "ATFR", "PCOA",
    // Tax books
    "FISA", "FISR",
    // Human resources and time keeping
    "GPEA", "GPER", "GPEM", "PONA", "PONM", "APDA", "CSAA",
    // Sales, CRM, retail
    "FATA", "FATR", "CRMA", "TMKA", "LOJA", "LOJR", "OMSA",
    // Logistics and field service
    "WMSA", "TMSA", "TECA", "MNTA",
    // Quality, contracts, foreign trade
    "QIEA", "QDOA", "CNTA", "EECA", "EICA",
];

/// Number of lines read from a file for content inspection.
pub const CONTENT_HEAD_LINES: usize = 200;

static CUSTOM_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[r"(?m)^\s*USER\s+(?:FUNCTION|PROCEDURE)\s+\w+"])
});

static STANDARD_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r#"(?m)^\s*#\s*INCLUDE\s+["'](?:FIVEWIN|TOTVS|PROTHEUS)\.CH["']"#,
        r"(?m)^\s*(?:MAIN\s+)?FUNCTION\s+\w+",
        r"\bMENUDEF\s*\(",
        r"\bWSSERVICE\b",
    ])
});

static STRUCTURAL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}\d{3}$").expect("valid regex"));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Whether the routine name carries the custom prefix.
    pub custom_prefixed: bool,
    /// Prefix-stripped, upper-cased routine name.
    pub key: &'a str,
    /// Upper-cased head of the routine's file, when a file was inspected.
    pub content: Option<&'a str>,
    /// Prefixes learned by the discovery pass.
    pub discovered: &'a BTreeSet<String>,
}

/// A named classification rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Stable identifier reported alongside decisions.
    pub name: &'static str,
    /// Whether the rule reads file content; content is loaded lazily before
    /// the first such rule runs.
    pub needs_content: bool,
    /// The verdict function.
    pub eval: fn(&RuleInput<'_>) -> Option<bool>,
}

/// Rules in precedence order. The last rule always decides.
pub const RULES: [Rule; 5] = [
    Rule {
        name: "custom_prefix",
        needs_content: false,
        eval: custom_prefix,
    },
    Rule {
        name: "known_prefix",
        needs_content: false,
        eval: known_prefix,
    },
    Rule {
        name: "content_markers",
        needs_content: true,
        eval: content_markers,
    },
    Rule {
        name: "structural_shape",
        needs_content: false,
        eval: structural_shape,
    },
    Rule {
        name: "default_custom",
        needs_content: false,
        eval: default_custom,
    },
];

/// What the content heuristic concluded about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVerdict {
    /// A custom marker was found.
    Custom,
    /// A standard marker was found and no custom marker.
    Standard,
    /// Neither marker group matched.
    Inconclusive,
}

impl ContentVerdict {
    /// Inconclusive content counts as standard.
    #[must_use]
    pub fn is_standard(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// Run the marker groups over upper-cased content. Custom markers win.
#[must_use]
pub fn inspect_content(upper: &str) -> ContentVerdict {
    if CUSTOM_MARKERS.iter().any(|re| re.is_match(upper)) {
        ContentVerdict::Custom
    } else if STANDARD_MARKERS.iter().any(|re| re.is_match(upper)) {
        ContentVerdict::Standard
    } else {
        ContentVerdict::Inconclusive
    }
}

/// Returns `true` if `key` starts with a built-in or discovered prefix.
#[must_use]
pub fn matches_known_prefix(key: &str, discovered: &BTreeSet<String>) -> bool {
    BUILTIN_PREFIXES.iter().any(|p| key.starts_with(p))
        || discovered.iter().any(|p| key.starts_with(p.as_str()))
}

fn custom_prefix(input: &RuleInput<'_>) -> Option<bool> {
    input.custom_prefixed.then_some(false)
}

fn known_prefix(input: &RuleInput<'_>) -> Option<bool> {
    matches_known_prefix(input.key, input.discovered).then_some(true)
}

fn content_markers(input: &RuleInput<'_>) -> Option<bool> {
    input.content.map(|upper| inspect_content(upper).is_standard())
}

fn structural_shape(input: &RuleInput<'_>) -> Option<bool> {
    STRUCTURAL_SHAPE.is_match(input.key).then_some(true)
}

fn default_custom(_input: &RuleInput<'_>) -> Option<bool> {
    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input<'a>(key: &'a str, content: Option<&'a str>, discovered: &'a BTreeSet<String>) -> RuleInput<'a> {
        RuleInput {
            custom_prefixed: false,
            key,
            content,
            discovered,
        }
    }

    #[test]
    fn rules_are_in_documented_order() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "custom_prefix",
                "known_prefix",
                "content_markers",
                "structural_shape",
                "default_custom"
            ]
        );
        assert!(RULES.iter().filter(|r| r.needs_content).count() == 1);
    }

    #[test]
    fn custom_prefix_only_fires_for_prefixed_names() {
        let empty = BTreeSet::new();
        let mut i = input("MATA010", None, &empty);
        assert_eq!(custom_prefix(&i), None);
        i.custom_prefixed = true;
        assert_eq!(custom_prefix(&i), Some(false));
    }

    #[test]
    fn known_prefix_uses_builtin_and_discovered_sets() {
        let mut discovered = BTreeSet::new();
        assert_eq!(known_prefix(&input("FINA050", None, &discovered)), Some(true));
        assert_eq!(known_prefix(&input("XPTO01", None, &discovered)), None);

        discovered.insert("XPTO".to_string());
        assert_eq!(known_prefix(&input("XPTO01", None, &discovered)), Some(true));
    }

    #[rstest]
    #[case::user_function("USER FUNCTION PCMCTF43()\nRETURN", ContentVerdict::Custom)]
    #[case::indented_user_procedure("   USER   PROCEDURE X\n", ContentVerdict::Custom)]
    #[case::vendor_include("#INCLUDE \"FIVEWIN.CH\"\n", ContentVerdict::Standard)]
    #[case::plain_function("FUNCTION MATA010()\n", ContentVerdict::Standard)]
    #[case::menudef("STATIC FUNCTION MENUDEF()\n", ContentVerdict::Standard)]
    #[case::custom_beats_standard(
        "#INCLUDE \"PROTHEUS.CH\"\nUSER FUNCTION X()\n",
        ContentVerdict::Custom
    )]
    #[case::static_only("STATIC FUNCTION HELPER()\n", ContentVerdict::Inconclusive)]
    #[case::empty("", ContentVerdict::Inconclusive)]
    fn content_markers_classify(#[case] upper: &str, #[case] expected: ContentVerdict) {
        assert_eq!(inspect_content(upper), expected);
    }

    #[test]
    fn inconclusive_content_counts_as_standard() {
        let empty = BTreeSet::new();
        assert_eq!(content_markers(&input("X", Some("// NADA\n"), &empty)), Some(true));
        assert_eq!(content_markers(&input("X", None, &empty)), None);
    }

    #[rstest]
    #[case("ABCD123", Some(true))]
    #[case("ABC123", None)]
    #[case("ABCD1234", None)]
    #[case("PCMCTF43", None)]
    fn structural_shape_is_four_letters_three_digits(
        #[case] key: &str,
        #[case] expected: Option<bool>,
    ) {
        let empty = BTreeSet::new();
        assert_eq!(structural_shape(&input(key, None, &empty)), expected);
    }

    #[test]
    fn default_rule_always_decides_custom() {
        let empty = BTreeSet::new();
        assert_eq!(default_custom(&input("ANYTHING", None, &empty)), Some(false));
    }
}
