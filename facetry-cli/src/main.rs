//! # facetry CLI
//!
//! Command-line interface for inspecting and validating facetry metamodels.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facetry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to facetry.yml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print specifications and their members with the winning facets
    Inspect {
        /// YAML domain description
        domain: PathBuf,

        /// Only this logical type
        #[arg(long = "type")]
        type_name: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Introspect every type and report metamodel problems
    Validate {
        /// YAML domain description
        domain: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Inspect {
            domain,
            type_name,
            json,
        } => commands::inspect(config, &domain, type_name.as_deref(), json),
        Commands::Validate { domain, json } => commands::validate(config, &domain, json),
    }
}
