//! `sonda routine` command implementation.

use std::path::PathBuf;

use colored::Colorize;
use sonda::structure::DeclarationKind;
use sonda::{Environment, RoutineAction, RoutineRequest, Sonda};

use super::display::{origin_label, print_diagnostics, print_json, print_list, print_metadata};

/// Run the routine command.
pub fn run(
    sonda: &Sonda,
    name: &str,
    environment: &str,
    root: Option<PathBuf>,
    action: &str,
    json: bool,
) -> Result<bool, sonda::Error> {
    let request = RoutineRequest {
        routine: name.to_string(),
        environment: Environment::parse(environment)?,
        root,
        action: RoutineAction::parse(action)?,
    };

    let envelope = sonda.resolve_routine(&request)?;
    if json {
        print_json(&envelope)?;
        return Ok(envelope.success);
    }

    let Some(data) = envelope.data else {
        println!(
            "{} {}",
            "Not found:".red().bold(),
            envelope.message.unwrap_or_default()
        );
        if let Some(metadata) = &envelope.metadata {
            print_metadata(metadata);
        }
        if let Some(diagnostics) = &envelope.diagnostics {
            print_diagnostics(diagnostics);
        }
        return Ok(false);
    };

    // Raw outputs go straight to stdout so they can be piped.
    if let Some(source) = &data.source {
        print!("{source}");
        return Ok(true);
    }
    if let Some(report) = &data.report {
        print!("{report}");
        return Ok(true);
    }

    println!("{} {}", data.routine.white().bold(), data.path.display());
    if let Some(metadata) = &envelope.metadata {
        print_metadata(metadata);
        if let Some(origin) = metadata.classification {
            println!(
                "  {}: {} {}",
                "Origin".white().bold(),
                origin_label(origin),
                format!("({})", metadata.classification_rule.unwrap_or("unknown")).dimmed()
            );
        }
    }

    if let Some(outline) = &data.structure {
        println!();
        println!(
            "  {}: {}   {}: {}",
            "Lines".white().bold(),
            outline.lines,
            "Protheus.doc".white().bold(),
            outline.protheus_doc_blocks
        );
        let includes: Vec<&str> = outline.includes.iter().map(String::as_str).collect();
        let tables: Vec<&str> = outline.tables.iter().map(String::as_str).collect();
        print_list("Includes", &includes, "none");
        print_list("User functions", &outline.names(DeclarationKind::UserFunction), "none");
        print_list("Static functions", &outline.names(DeclarationKind::StaticFunction), "none");
        print_list("Classes", &outline.names(DeclarationKind::Class), "none");
        print_list("Tables", &tables, "none");

        let undocumented = outline.undocumented();
        if !undocumented.is_empty() {
            println!(
                "  {}: {} declarations without Protheus.doc",
                "Warning".yellow().bold(),
                undocumented.len().to_string().yellow()
            );
        }
    }

    if let Some(git) = &data.git {
        println!();
        match &git.message {
            Some(message) => println!("  {}: {}", "Git".white().bold(), message.dimmed()),
            None => {
                println!(
                    "  {}: {}",
                    "Branch".white().bold(),
                    git.branch.as_deref().unwrap_or("?").cyan()
                );
                println!(
                    "  {}: {}",
                    "Status".white().bold(),
                    git.status.as_deref().unwrap_or("unmodified")
                );
                if let Some(commit) = &git.last_commit {
                    println!("  {}: {}", "Last commit".white().bold(), commit);
                }
            }
        }
    }

    Ok(true)
}
