//! `sonda env` command implementation.

use colored::Colorize;
use serde::Serialize;
use sonda::{ClassifierStats, EnvironmentInfo, Sonda};

use super::display::print_json;

#[derive(Serialize)]
struct EnvReport {
    environments: Vec<EnvironmentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classifier: Option<ClassifierStats>,
}

/// Run the env command.
pub fn run(sonda: &Sonda, discover: bool, json: bool) -> Result<bool, sonda::Error> {
    let environments = sonda.environments();
    let classifier = discover.then(|| {
        sonda.discover();
        sonda.classifier().stats()
    });

    if json {
        print_json(&EnvReport {
            environments,
            classifier,
        })?;
        return Ok(true);
    }

    println!("{}", "Sonda Environments".cyan().bold());
    println!();
    for env in &environments {
        let root = match &env.root {
            Some(root) if env.exists => root.display().to_string().green().to_string(),
            Some(root) => format!("{} {}", root.display(), "(missing)".red()),
            None => "not configured".dimmed().to_string(),
        };
        println!("  {:<11} {}", env.environment.as_str().white().bold(), root);
        println!("  {:<11} {}", "", format!("set {}", env.setting).dimmed());
    }

    if let Some(stats) = classifier {
        println!();
        println!(
            "  {}: {} files inspected",
            "Discovery".white().bold(),
            stats.content_inspections
        );
        if stats.discovered_prefixes.is_empty() {
            println!("    {}", "no prefixes beyond the built-in table".dimmed());
        } else {
            println!("    {}", stats.discovered_prefixes.join(", "));
        }
    }

    Ok(true)
}
