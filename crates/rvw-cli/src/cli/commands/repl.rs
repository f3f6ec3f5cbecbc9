//! Implementation of `rvw repl`.
//!
//! Each input line is split shell-style and parsed with the same argument
//! definitions as the one-shot subcommands, so `list --min-rating 4` means the
//! same thing at the prompt as on the command line.

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use rvw_core::core::ReviewService;

use crate::cli::commands::{import, reviews, stats};
use crate::cli::{ImportArgs, ListArgs, SearchArgs, ShowArgs, StatsArgs};
use crate::output::OutputFormat;

const PROMPT: &str = "rvw> ";

#[derive(Parser, Debug)]
#[command(name = "rvw", no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand, Debug)]
enum ReplCommand {
    /// Load reviews from a JSON or NDJSON dump
    Import(ImportArgs),
    /// List reviews matching filters
    List(ListArgs),
    /// Show a single review
    Show(ShowArgs),
    /// Search review text and titles
    Search(SearchArgs),
    /// Rating histogram and per-source counts
    Stats(StatsArgs),
    /// Leave the prompt
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until `quit` or end of input.
#[tracing::instrument(skip_all)]
pub fn run_repl(
    service: &mut ReviewService,
    format: OutputFormat,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "rvw interactive mode. Type 'help' for commands, 'quit' to leave.")?;
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        if execute_line(service, line.trim(), format, out)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Run one line. Command failures are reported and the session continues;
/// only write failures on `out` end it.
fn execute_line(
    service: &mut ReviewService,
    line: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Flow> {
    if line.is_empty() {
        return Ok(Flow::Continue);
    }
    let words = match split_line(line) {
        Ok(words) => words,
        Err(msg) => {
            writeln!(out, "error: {msg}")?;
            return Ok(Flow::Continue);
        }
    };
    let parsed = match ReplLine::try_parse_from(&words) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Also covers `help` and `--help`, which clap reports as errors.
            write!(out, "{}", e.render())?;
            return Ok(Flow::Continue);
        }
    };

    let result = match &parsed.command {
        ReplCommand::Import(args) => import::run_import(service, args, format, out),
        ReplCommand::List(args) => reviews::run_list(service, args, format, out),
        ReplCommand::Show(args) => reviews::run_show(service, args, format, out),
        ReplCommand::Search(args) => reviews::run_search(service, args, format, out),
        ReplCommand::Stats(args) => stats::run_stats(service, args, format, out),
        ReplCommand::Quit => return Ok(Flow::Quit),
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "repl command failed");
        writeln!(out, "error: {e:#}")?;
    }
    Ok(Flow::Continue)
}

/// Split a line into words, honoring single quotes, double quotes and
/// backslash escapes.
fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated single quote".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err("unterminated double quote".to_string()),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated double quote".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => return Err("trailing backslash".to_string()),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
