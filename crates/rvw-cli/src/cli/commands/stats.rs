//! Implementation of `rvw stats`.

use std::io::Write;

use anyhow::Result;
use rvw_core::core::ReviewService;

use crate::cli::commands::helpers::build_filters;
use crate::cli::StatsArgs;
use crate::output::{Formatter, OutputFormat};

/// Print the rating histogram and per-source counts for matching reviews.
#[tracing::instrument(skip(service, out))]
pub fn run_stats(
    service: &ReviewService,
    args: &StatsArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let filters = build_filters(&args.filters)?;
    let stats = service.stats(Some(&filters))?;
    writeln!(out, "{}", Formatter::new(format).format(&stats)?)?;
    Ok(())
}
