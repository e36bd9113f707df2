//! Match command: find the special folder containing each path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use folderpaths_core::FolderMatch;
use serde::Serialize;
use tracing::instrument;

use super::CommandContext;
use crate::output::{self, OutputFormat, UNRESOLVED};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Paths to resolve (relative paths are taken from the current directory)
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Show every containing folder, not just the best one
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Some inputs matched nothing. Carries the number of misses.
#[derive(Debug, thiserror::Error)]
#[error("{0} path(s) matched no special folder")]
pub struct NoMatch(pub usize);

#[derive(Serialize)]
struct MatchReport {
    input: PathBuf,
    relative: Option<String>,
    matches: Vec<FolderMatch>,
}

#[instrument(level = "info", name = "cmd::match", skip_all)]
pub fn execute(ctx: &CommandContext<'_>, args: &Args) -> Result<()> {
    ctx.service
        .reload()
        .context("Failed to query special folders")?;
    let case = ctx.service.case_sensitivity();

    let mut reports = Vec::with_capacity(args.paths.len());
    for raw in &args.paths {
        let input = absolutize(raw)?;
        let mut matches = ctx
            .service
            .matching_folders(&input)
            .with_context(|| format!("Cannot match {}", raw.display()))?;
        if !args.all {
            matches.truncate(1);
        }
        let relative = matches.first().and_then(|m| m.relative_part(case));
        reports.push(MatchReport {
            input,
            relative,
            matches,
        });
    }

    let misses = reports.iter().filter(|r| r.matches.is_empty()).count();

    match args.format {
        OutputFormat::Json => output::print_json(&reports)?,
        OutputFormat::Table => {
            let mut table = output::table(ctx.color, &["Path", "Folder", "Folder path", "Relative"]);
            for report in &reports {
                if report.matches.is_empty() {
                    table.add_row(vec![
                        report.input.display().to_string(),
                        UNRESOLVED.to_string(),
                        UNRESOLVED.to_string(),
                        UNRESOLVED.to_string(),
                    ]);
                    continue;
                }
                for (rank, found) in report.matches.iter().enumerate() {
                    let (input, relative) = if rank == 0 {
                        (
                            report.input.display().to_string(),
                            report.relative.clone().unwrap_or_default(),
                        )
                    } else {
                        (String::new(), String::new())
                    };
                    table.add_row(vec![
                        input,
                        found.name.clone(),
                        found.path.display().to_string(),
                        relative,
                    ]);
                }
            }
            println!("{table}");
        }
    }

    if misses > 0 {
        return Err(NoMatch(misses).into());
    }
    Ok(())
}

fn absolutize(path: &std::path::Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Cannot resolve {}", path.display()))
}
