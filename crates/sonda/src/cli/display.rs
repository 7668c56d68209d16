//! Common display utilities for CLI commands.

use colored::Colorize;
use serde::Serialize;
use sonda::{Diagnostics, Metadata, RoutineOrigin};

const MAX_DISPLAY_ITEMS: usize = 10;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), sonda::Error> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}

/// Colored origin label.
pub fn origin_label(origin: RoutineOrigin) -> colored::ColoredString {
    match origin {
        RoutineOrigin::Standard => "standard".blue(),
        RoutineOrigin::Custom => "custom".yellow(),
    }
}

/// Print the resolved environment and root.
pub fn print_metadata(metadata: &Metadata) {
    let manual = if metadata.manual_override {
        " (manual override)".dimmed().to_string()
    } else {
        String::new()
    };
    println!(
        "  {}: {}{}",
        "Environment".white().bold(),
        metadata.environment.cyan(),
        manual
    );
    println!("  {}: {}", "Root".white().bold(), metadata.root.display());
}

/// Print the context of a negative outcome.
///
/// Shows up to `MAX_DISPLAY_ITEMS` attempted variations. If there are more,
/// shows "... and N more".
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    println!(
        "  {}: {}",
        "Searched".white().bold(),
        diagnostics.searched_root.display()
    );
    println!(
        "  {}: {}",
        "Files scanned".white().bold(),
        diagnostics.files_scanned
    );

    if !diagnostics.attempted_variations.is_empty() {
        println!("  {}:", "Tried".white().bold());
        for variation in diagnostics.attempted_variations.iter().take(MAX_DISPLAY_ITEMS) {
            println!("    {} {}", "•".dimmed(), variation);
        }
        if diagnostics.attempted_variations.len() > MAX_DISPLAY_ITEMS {
            println!(
                "    {} ... and {} more",
                "•".dimmed(),
                diagnostics.attempted_variations.len() - MAX_DISPLAY_ITEMS
            );
        }
    }

    if !diagnostics.skipped.is_empty() {
        println!(
            "  {}: {} entries could not be read",
            "Warning".yellow().bold(),
            diagnostics.skipped.len().to_string().yellow()
        );
    }
}

/// Print a bulleted list, or `empty_message` when there is nothing to show.
pub fn print_list(title: &str, items: &[&str], empty_message: &str) {
    println!("  {}:", title.white().bold());
    if items.is_empty() {
        println!("    {}", empty_message.dimmed());
        return;
    }
    for item in items {
        println!("    {} {}", "•".dimmed(), item);
    }
}
