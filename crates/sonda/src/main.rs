//! Sonda CLI - Find Protheus routines and table usage from the command line.
//!
//! Sonda walks ADVPL source trees on every call; there is no index to build.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use sonda::{Sonda, SondaConfig};
use tracing_subscriber::EnvFilter;

mod cli;

/// Sonda: Routine and table locator for Protheus source trees.
#[derive(Parser)]
#[command(name = "sonda")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// YAML configuration file (defaults to $SONDA_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the JSON result envelope instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate a routine and describe it
    Routine {
        /// Routine name (e.g. U_PCMCTF43, pcmctf43.prw, MATA010)
        name: String,

        /// Environment (staging|hml, production|prod|prd, standard|vendor|padrao, auto)
        #[arg(short, long, default_value = "auto")]
        environment: String,

        /// Search this directory instead of the environment's root
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// What to show (locate, structure, report, source, git_status)
        #[arg(short, long, default_value = "locate")]
        action: String,
    },

    /// List routines that use a table
    Table {
        /// Table alias (e.g. SA1, PD3)
        table: String,

        /// Environment (staging|hml, production|prod|prd, standard|vendor|padrao, auto)
        #[arg(short, long, default_value = "auto")]
        environment: String,

        /// Search this directory instead of the environment's root
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Include vendor-standard routines
        #[arg(long)]
        include_standard: bool,

        /// Maximum number of routines (defaults to the configured max-results)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// Show configured environment roots
    Env {
        /// Also run standard-prefix discovery and list what it learned
        #[arg(long)]
        discover: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match SondaConfig::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            return ExitCode::FAILURE;
        }
    };
    let sonda = Sonda::new(config);

    let result = match cli.command {
        Commands::Routine {
            name,
            environment,
            root,
            action,
        } => cli::routine::run(&sonda, &name, &environment, root, &action, cli.json),
        Commands::Table {
            table,
            environment,
            root,
            include_standard,
            max_results,
        } => cli::table::run(
            &sonda,
            &table,
            &environment,
            root,
            include_standard,
            max_results,
            cli.json,
        ),
        Commands::Env { discover } => cli::env::run(&sonda, discover, cli.json),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
