//! `matdiscover` command line entry point.
//!
//! # Responsibility
//! - Expose the discovery read operations as JSON-printing subcommands.
//! - Read configuration from the environment, with path overrides.

use clap::{Parser, Subcommand};
use log::error;
use matdiscover_core::{default_log_level, init_logging, DiscoverConfig, DiscoverService};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "matdiscover")]
#[command(about = "Query curated materials in a provenance store", version)]
struct Cli {
    /// Absolute directory for rolling log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Overrides `MATDISCOVER_DB`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Overrides `MATDISCOVER_ALLOWLIST`.
    #[arg(long, global = true)]
    allowlist: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the quantity catalog in declaration order.
    Quantities,
    /// Material selection table in display order.
    Table,
    /// x/y/color figure data over all materials.
    Figure {
        #[arg(long, default_value = "Largest Included Sphere Diameter")]
        x: String,
        #[arg(long, default_value = "Geometric Void Fraction")]
        y: String,
        #[arg(long, default_value = "Density")]
        color: String,
    },
    /// Detail view of one material.
    Detail { material_id: String },
    /// Isotherm outputs of one material, grouped by gas.
    Isotherms { material_id: String },
    /// Write optimized CIF files into a new directory.
    ExportCifs { dir: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_failed module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let mut config = DiscoverConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(allowlist) = cli.allowlist {
        config.allowlist_path = allowlist;
    }

    let service = DiscoverService::open(&config)?;
    match cli.command {
        Command::Quantities => print_json(&service.catalog().iter().collect::<Vec<_>>())?,
        Command::Table => print_json(&service.material_table()?)?,
        Command::Figure { x, y, color } => print_json(&service.figure(&x, &y, &color)?)?,
        Command::Detail { material_id } => match service.detail(&material_id)? {
            Some(view) => print_json(&view)?,
            None => return Err(format!("material not found: `{material_id}`").into()),
        },
        Command::Isotherms { material_id } => print_json(&service.isotherms(&material_id)?)?,
        Command::ExportCifs { dir } => print_json(&service.export_optimized_cifs(&dir)?)?,
    }
    service.close()?;
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
