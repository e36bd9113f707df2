//! List command: show the resolved special folders.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use folderpaths_core::FolderEntry;
use tracing::instrument;

use super::CommandContext;
use crate::output::{self, OutputFormat};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Include folders that have no path on this host
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[instrument(level = "info", name = "cmd::list", skip_all)]
pub fn execute(ctx: &CommandContext<'_>, args: &Args) -> Result<()> {
    let summary = ctx
        .service
        .reload()
        .context("Failed to query special folders")?;

    let entries: Vec<FolderEntry> = ctx
        .service
        .entries()
        .into_iter()
        .filter(|entry| args.all || entry.path.is_some())
        .collect();

    match args.format {
        OutputFormat::Json => output::print_json(&entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No special folders resolved");
                return Ok(());
            }

            let mut table = output::table(ctx.color, &["Folder", "Path"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.name.clone(),
                    output::display_path(entry.path.as_deref()),
                ]);
            }
            println!("{table}");

            if !args.all && !summary.unresolved.is_empty() && !ctx.quiet {
                eprintln!(
                    "{} folder(s) not available on this host (use --all to show)",
                    summary.unresolved.len()
                );
            }
        }
    }

    Ok(())
}
