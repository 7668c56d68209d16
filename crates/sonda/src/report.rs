//! Markdown report for a single routine.

use std::fmt::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::classifier::RoutineOrigin;
use crate::structure::{DeclarationKind, RoutineStructure};

/// Everything a report is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    /// Routine name as resolved.
    pub routine: &'a str,
    /// File the routine lives in.
    pub path: &'a Path,
    /// Standard or custom.
    pub origin: RoutineOrigin,
    /// Environment label the file was found in.
    pub environment: &'a str,
    /// Outline of the file.
    pub structure: &'a RoutineStructure,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Render the report into `w`.
///
/// # Errors
///
/// Returns an error only if the writer fails.
pub fn write_report<W: Write>(w: &mut W, input: &ReportInput<'_>) -> fmt::Result {
    let s = input.structure;

    writeln!(w, "# Routine {}\n", input.routine)?;
    writeln!(w, "| Field | Value |\n|---|---|")?;
    writeln!(w, "| File | `{}` |", input.path.display())?;
    writeln!(w, "| Environment | {} |", input.environment)?;
    writeln!(w, "| Origin | {} |", input.origin)?;
    writeln!(w, "| Lines | {} |", s.lines)?;
    writeln!(w, "| Protheus.doc blocks | {} |", s.protheus_doc_blocks)?;
    writeln!(
        w,
        "| Generated | {} |\n",
        input.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let includes: Vec<&str> = s.includes.iter().map(String::as_str).collect();
    let tables: Vec<&str> = s.tables.iter().map(String::as_str).collect();
    write_section(w, "Includes", &includes)?;
    write_section(w, "User functions", &s.names(DeclarationKind::UserFunction))?;
    write_section(w, "Static functions", &s.names(DeclarationKind::StaticFunction))?;
    write_section(w, "Classes", &s.names(DeclarationKind::Class))?;
    write_section(w, "Tables", &tables)?;

    let undocumented = s.undocumented();
    if !undocumented.is_empty() {
        writeln!(w, "## Missing Protheus.doc\n")?;
        for d in undocumented {
            writeln!(w, "- `{}` (line {})", d.name, d.line)?;
        }
        writeln!(w)?;
    }

    writeln!(w, "## Flow\n\n```mermaid")?;
    write_flowchart(w, input.routine, s)?;
    writeln!(w, "```")
}

fn write_section<W: Write>(w: &mut W, title: &str, items: &[&str]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(w, "## {title}\n")?;
    for item in items {
        writeln!(w, "- `{item}`")?;
    }
    writeln!(w)
}

/// Mermaid flowchart: the routine, its functions, and the tables it touches.
///
/// # Errors
///
/// Returns an error only if the writer fails.
pub fn write_flowchart<W: Write>(w: &mut W, routine: &str, s: &RoutineStructure) -> fmt::Result {
    let root = node_id("R", routine);
    writeln!(w, "flowchart TD")?;
    writeln!(w, "    {root}[\"{routine}\"]")?;

    for d in s.declarations.iter().filter(|d| {
        matches!(
            d.kind,
            DeclarationKind::UserFunction | DeclarationKind::StaticFunction | DeclarationKind::Function
        )
    }) {
        let id = node_id("F", &d.name);
        writeln!(w, "    {root} --> {id}[\"{}()\"]", d.name)?;
    }
    for table in &s.tables {
        let id = node_id("T", table);
        writeln!(w, "    {root} -.-> {id}[(\"{table}\")]")?;
    }
    Ok(())
}

fn node_id(kind: &str, name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{kind}_{clean}")
}
