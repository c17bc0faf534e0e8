//! dynform CLI
//!
//! Operator tooling for dynamic form schemas.
//!
//! # Usage
//!
//! ```bash
//! dynform check loan-application.json
//! dynform validate --schema loan-application.json --values submission.json
//! dynform replay --schema loan-application.json --changes edits.json --revalidation all
//! dynform payload --schema loan-application.json --values submission.json --format json
//! dynform slug "Loan Application 2024"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use dynform_engine::Revalidation;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dynform")]
#[command(version)]
#[command(about = "Dynamic form schema tooling", long_about = None)]
struct Cli {
    /// Output format (defaults to the config file, then table)
    #[arg(long, short, env = "DYNFORM_FORMAT")]
    format: Option<OutputFormat>,

    /// Which fields a value change re-validates
    #[arg(long, env = "DYNFORM_REVALIDATION")]
    revalidation: Option<RevalidationArg>,

    /// Profile name from config file
    #[arg(long, short, env = "DYNFORM_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RevalidationArg {
    Dependents,
    All,
}

impl From<RevalidationArg> for Revalidation {
    fn from(arg: RevalidationArg) -> Self {
        match arg {
            RevalidationArg::Dependents => Revalidation::Dependents,
            RevalidationArg::All => Revalidation::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema and list its fields
    Check { schema: PathBuf },
    /// Validate a values snapshot against a schema
    Validate {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        values: PathBuf,
    },
    /// Apply value changes one at a time and show what each revalidates
    Replay {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        changes: PathBuf,
    },
    /// Validate and show the submission parts for a values snapshot
    Payload {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        values: PathBuf,
    },
    /// Derive a URL slug from a form name
    Slug { name: String },
}

pub(crate) fn ok_label() -> ColoredString {
    "OK".green().bold()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = config::Config::load(cli.profile.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config not loaded, using defaults: {:#}", e);
        config::Config::default()
    });
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_config))
        .unwrap_or(OutputFormat::Table);
    let engine = config.engine_config(cli.revalidation.map(Into::into));

    let result = match cli.command {
        Commands::Check { schema } => commands::check::handle(&schema, format),
        Commands::Validate { schema, values } => commands::validate::handle(&schema, &values, &engine, format),
        Commands::Replay { schema, changes } => commands::replay::handle(&schema, &changes, &engine, format),
        Commands::Payload { schema, values } => commands::payload::handle(&schema, &values, &engine, format).await,
        Commands::Slug { name } => commands::slug::handle(&name, format),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
