//! Ensure command: create special folders that are missing on disk.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use folderpaths_core::{DirectoryProber, FsProber};
use serde::Serialize;
use tracing::instrument;

use super::{CommandContext, canonical_name};
use crate::output::{self, OutputFormat};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Folder names (built-in names are case-insensitive)
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,

    /// Deadline for each filesystem call (e.g. "500ms", "2s")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "500ms")]
    pub timeout: Duration,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct Ensured {
    name: String,
    path: std::path::PathBuf,
    created: bool,
}

#[instrument(level = "info", name = "cmd::ensure", skip_all)]
pub fn execute(ctx: &CommandContext<'_>, args: &Args) -> Result<()> {
    ctx.service
        .reload()
        .context("Failed to query special folders")?;
    let prober = FsProber::new(args.timeout);

    let mut ensured = Vec::with_capacity(args.names.len());
    for raw in &args.names {
        let name = canonical_name(raw);
        let existed = ctx
            .service
            .folder_path(&name)
            .is_ok_and(|path| prober.exists(&path));
        let path = ctx
            .service
            .ensure_folder(&name, &prober)
            .with_context(|| format!("Failed to ensure folder '{name}'"))?;
        ensured.push(Ensured {
            name,
            path,
            created: !existed,
        });
    }

    match args.format {
        OutputFormat::Json => output::print_json(&ensured)?,
        OutputFormat::Table => {
            let mut table = output::table(ctx.color, &["Folder", "Path", "Status"]);
            for item in &ensured {
                table.add_row(vec![
                    item.name.clone(),
                    item.path.display().to_string(),
                    if item.created { "created" } else { "exists" }.to_string(),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
