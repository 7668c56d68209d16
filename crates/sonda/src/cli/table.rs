//! `sonda table` command implementation.

use std::path::PathBuf;

use colored::Colorize;
use sonda::{Environment, Sonda, TableRequest, UsageCategory};

use super::display::{origin_label, print_diagnostics, print_json, print_metadata};

/// Run the table command.
pub fn run(
    sonda: &Sonda,
    table: &str,
    environment: &str,
    root: Option<PathBuf>,
    include_standard: bool,
    max_results: Option<usize>,
    json: bool,
) -> Result<bool, sonda::Error> {
    let request = TableRequest {
        table: table.to_string(),
        environment: Environment::parse(environment)?,
        root,
        include_standard,
        max_results,
    };

    let envelope = sonda.search_table(&request)?;
    if json {
        print_json(&envelope)?;
        return Ok(envelope.success);
    }

    let Some(rows) = envelope.data else {
        println!("{}", envelope.message.unwrap_or_default());
        if let Some(metadata) = &envelope.metadata {
            print_metadata(metadata);
        }
        if let Some(diagnostics) = &envelope.diagnostics {
            print_diagnostics(diagnostics);
        }
        if !include_standard {
            println!(
                "\n{}: Standard routines are excluded by default. Try '{}'.",
                "hint".dimmed(),
                format!("sonda table {table} --include-standard").cyan()
            );
        }
        return Ok(false);
    };

    println!(
        "Found {} routines using {}:",
        rows.len().to_string().green().bold(),
        table.to_uppercase().cyan()
    );
    if let Some(metadata) = &envelope.metadata {
        print_metadata(metadata);
    }
    println!();

    for row in &rows {
        let mut ops = Vec::new();
        if row.flags.has_insert {
            ops.push("insert");
        }
        if row.flags.has_update {
            ops.push("update");
        }
        if row.flags.has_delete {
            ops.push("delete");
        }
        let ops = if ops.is_empty() {
            String::new()
        } else {
            format!(" [{}]", ops.join(", "))
        };

        println!(
            "  {} {} {} {}",
            format!("{:<11}", row.category.as_str()).magenta(),
            row.routine.white().bold(),
            format!("x{}", row.occurrences).dimmed(),
            origin_label(row.origin)
        );
        println!("    {}{}", row.path.display().to_string().dimmed(), ops);
        if !row.user_functions.is_empty() {
            println!("    {} {}", "user:".dimmed(), row.user_functions.join(", "));
        }
    }

    if let Some(metadata) = &envelope.metadata {
        if let Some(summary) = &metadata.summary {
            println!();
            let parts: Vec<String> = UsageCategory::ALL
                .iter()
                .filter_map(|c| summary.get(c).map(|n| format!("{c}: {n}")))
                .collect();
            println!("  {}: {}", "Summary".white().bold(), parts.join(", "));
        }
        if metadata.limit_reached == Some(true) {
            println!(
                "  {}: stopped at the result cap; raise it with {}",
                "Note".yellow().bold(),
                "-n".cyan()
            );
        }
    }

    Ok(true)
}
