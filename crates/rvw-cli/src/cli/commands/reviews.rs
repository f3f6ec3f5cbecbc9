//! Implementation of `rvw list`, `rvw show` and `rvw search`.

use std::io::Write;

use anyhow::Result;
use rvw_core::core::{CoreError, ReviewService};

use crate::cli::commands::helpers::{build_filters, review_not_found_error};
use crate::cli::{ListArgs, SearchArgs, ShowArgs};
use crate::output::{Formatter, OutputFormat};

/// List one page of reviews matching the filter flags.
#[tracing::instrument(skip(service, out))]
pub fn run_list(
    service: &ReviewService,
    args: &ListArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let filters = build_filters(&args.filters)?;
    let page = service.browse(Some(&filters), args.page, args.page_size)?;

    let footer = format!(
        "page {}/{}  ({} matching)",
        page.page, page.total_pages, page.total
    );
    let output = Formatter::new(format).format_list(
        &page.reviews,
        "No reviews found",
        "reviews",
        &[
            ("page", serde_json::json!(page.page)),
            ("page_size", serde_json::json!(page.page_size)),
            ("total", serde_json::json!(page.total)),
            ("total_pages", serde_json::json!(page.total_pages)),
        ],
        &[footer],
    )?;
    writeln!(out, "{output}")?;
    Ok(())
}

/// Show one review by id.
#[tracing::instrument(skip(service, out))]
pub fn run_show(
    service: &ReviewService,
    args: &ShowArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let review = match service.get(args.id) {
        Ok(review) => review,
        Err(CoreError::ReviewNotFound { id }) => return Err(review_not_found_error(id)),
        Err(e) => return Err(e.into()),
    };
    writeln!(out, "{}", Formatter::new(format).format(&review)?)?;
    Ok(())
}

/// Search review text and titles for any of the keywords.
#[tracing::instrument(skip(service, out))]
pub fn run_search(
    service: &ReviewService,
    args: &SearchArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let reviews = service.search(&args.keywords)?;
    let output = Formatter::new(format).format_list(
        &reviews,
        "No reviews match those keywords",
        "reviews",
        &[("keywords", serde_json::json!(args.keywords))],
        &[],
    )?;
    writeln!(out, "{output}")?;
    Ok(())
}
