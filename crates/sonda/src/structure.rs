//! Lexical outline of a routine file.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(user\s+function|static\s+func(?:tion)?|static\s+procedure|main\s+function|function|class|method|wsmethod)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("valid regex")
});

static PROTHEUS_DOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\s*protheus\.doc\s*\}").expect("valid regex"));

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*#\s*include\s+["']([^"']+)["']"#).expect("valid regex")
});

static ALIAS_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9]{2})\s*->").expect("valid regex"));

static SELECT_AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"DBSELECTAREA\s*\(\s*["']([A-Z0-9_]+)["']"#).expect("valid regex")
});

/// Kind of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// `User Function`.
    UserFunction,
    /// `Static Function` / `Static Func` / `Static Procedure`.
    StaticFunction,
    /// Plain or `Main` `Function` (vendor style).
    Function,
    /// `Class`.
    Class,
    /// `Method` / `WsMethod`.
    Method,
}

impl DeclarationKind {
    fn from_keyword(keyword: &str) -> Self {
        let keyword = keyword.to_ascii_uppercase();
        if keyword.starts_with("USER") {
            Self::UserFunction
        } else if keyword.starts_with("STATIC") {
            Self::StaticFunction
        } else if keyword == "CLASS" {
            Self::Class
        } else if keyword.ends_with("METHOD") {
            Self::Method
        } else {
            Self::Function
        }
    }
}

/// One declaration found in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// What was declared.
    pub kind: DeclarationKind,
    /// Declared name, case preserved.
    pub name: String,
    /// 1-based line number.
    pub line: usize,
    /// Whether a `{Protheus.doc}` block precedes it.
    pub documented: bool,
}

/// Outline of a routine file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutineStructure {
    /// Number of lines.
    pub lines: usize,
    /// `{Protheus.doc}` blocks.
    pub protheus_doc_blocks: usize,
    /// Included headers, in order.
    pub includes: Vec<String>,
    /// Every declaration, in order.
    pub declarations: Vec<Declaration>,
    /// Tables referenced through `ALIAS->` or `DbSelectArea`, sorted.
    pub tables: Vec<String>,
}

impl RoutineStructure {
    /// Names of declarations of `kind`, in order.
    #[must_use]
    pub fn names(&self, kind: DeclarationKind) -> Vec<&str> {
        self.declarations
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Functions and classes with no `{Protheus.doc}` block before them.
    #[must_use]
    pub fn undocumented(&self) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind != DeclarationKind::Method && !d.documented)
            .collect()
    }
}

/// Outline `content`.
///
/// A declaration counts as documented if a `{Protheus.doc}` marker appears
/// after the previous declaration and before it.
#[must_use]
pub fn analyze(content: &str) -> RoutineStructure {
    let mut outline = RoutineStructure::default();
    let mut doc_pending = false;

    for (index, line) in content.lines().enumerate() {
        outline.lines += 1;

        if PROTHEUS_DOC.is_match(line) {
            outline.protheus_doc_blocks += 1;
            doc_pending = true;
            continue;
        }
        if let Some(caps) = INCLUDE.captures(line) {
            outline.includes.push(caps[1].to_string());
            continue;
        }
        if let Some(caps) = DECLARATION.captures(line) {
            outline.declarations.push(Declaration {
                kind: DeclarationKind::from_keyword(&caps[1]),
                name: caps[2].to_string(),
                line: index + 1,
                documented: doc_pending,
            });
            doc_pending = false;
        }
    }

    let upper = content.to_uppercase();
    let tables: BTreeSet<String> = ALIAS_ARROW
        .captures_iter(&upper)
        .chain(SELECT_AREA.captures_iter(&upper))
        .map(|caps| caps[1].to_string())
        .filter(|alias| alias != "SELF")
        .collect();
    outline.tables = tables.into_iter().collect();

    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"#Include "Protheus.ch"
#include 'TopConn.ch'

/*/{Protheus.doc} PCMCTF43
Grava pedidos.
/*/
User Function PCMCTF43()
    DbSelectArea("PD3")
    PD3->(DbSetOrder(1))
    If SA1->A1_MSBLQL == "1"
        Return
    EndIf
Return

Static Function Grava()
Return

Class TPedido
    Method New()
EndClass
"#;

    #[test]
    fn counts_lines_and_doc_blocks() {
        let outline = analyze(SOURCE);
        assert_eq!(outline.lines, SOURCE.lines().count());
        assert_eq!(outline.protheus_doc_blocks, 1);
    }

    #[test]
    fn collects_includes_in_order() {
        let outline = analyze(SOURCE);
        assert_eq!(outline.includes, vec!["Protheus.ch", "TopConn.ch"]);
    }

    #[test]
    fn collects_declarations_with_documentation_state() {
        let outline = analyze(SOURCE);

        assert_eq!(outline.names(DeclarationKind::UserFunction), vec!["PCMCTF43"]);
        assert_eq!(outline.names(DeclarationKind::StaticFunction), vec!["Grava"]);
        assert_eq!(outline.names(DeclarationKind::Class), vec!["TPedido"]);
        assert_eq!(outline.names(DeclarationKind::Method), vec!["New"]);

        assert!(outline.declarations[0].documented);
        assert_eq!(outline.declarations[0].line, 7);
        let undocumented: Vec<&str> = outline.undocumented().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(undocumented, vec!["Grava", "TPedido"]);
    }

    #[test]
    fn collects_referenced_tables_sorted() {
        let outline = analyze(SOURCE);
        assert_eq!(outline.tables, vec!["PD3", "SA1"]);
    }

    #[test]
    fn empty_file_has_empty_outline() {
        assert_eq!(analyze(""), RoutineStructure::default());
    }
}
