//! rvw - browse, filter and search product reviews

mod cli;
mod config;
mod output;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use rvw_core::core::ReviewService;
use tracing_subscriber::EnvFilter;

use crate::cli::commands::helpers::open_service;
use crate::cli::commands::{import, repl, reviews, stats};
use crate::cli::{Cli, Commands};
use crate::config::resolve_store_config;
use crate::output::OutputFormat;

/// Environment variable holding the log filter directive.
const LOG_VAR: &str = "RVW_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = resolve_store_config(cli.backend, cli.db)?;
    let mut service = open_service(&config)?;
    let format = OutputFormat::from_json_flag(cli.json);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Import(args) => import::run_import(&mut service, &args, format, &mut out)?,
        Commands::List(args) => reviews::run_list(&service, &args, format, &mut out)?,
        Commands::Show(args) => reviews::run_show(&service, &args, format, &mut out)?,
        Commands::Search(args) => reviews::run_search(&service, &args, format, &mut out)?,
        Commands::Stats(args) => stats::run_stats(&service, &args, format, &mut out)?,
        Commands::Repl(args) => {
            if let Some(path) = &args.import {
                preload(&mut service, path)?;
            }
            let stdin = io::stdin();
            let mut input = stdin.lock();
            repl::run_repl(&mut service, format, &mut input, &mut out)?;
        }
        Commands::Ui(args) => {
            if let Some(path) = &args.import {
                preload(&mut service, path)?;
            }
            drop(out);
            rvw_tui::run(service)?;
            return Ok(());
        }
    }

    out.flush()?;
    Ok(())
}

/// `-v` forces debug; otherwise `RVW_LOG` applies, falling back to warn.
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn preload(service: &mut ReviewService, path: &Path) -> Result<()> {
    match service
        .import_if_stale(path)
        .with_context(|| format!("Failed to import {}", path.display()))?
    {
        Some(report) => tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            "preloaded reviews"
        ),
        None => tracing::debug!("database already current"),
    }
    Ok(())
}
