//! Watch command: reload on a timer and print folders that moved.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use folderpaths_core::{FolderEntries, FolderSnapshot};
use serde::Serialize;
use tracing::instrument;

use super::CommandContext;
use crate::output::{self, OutputFormat};

/// How often the snapshot is polled for a new generation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Reload interval (e.g. "30s", "5m"); defaults to `reload_interval` from config
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Exit after this many scheduled reloads, failed ones included
    #[arg(short, long, value_name = "N")]
    pub count: Option<u64>,

    /// Output format (json prints one object per line)
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Change {
    generation: u64,
    name: String,
    old: Option<PathBuf>,
    new: Option<PathBuf>,
}

#[instrument(level = "info", name = "cmd::watch", skip_all)]
pub fn execute(ctx: &CommandContext<'_>, args: &Args) -> Result<()> {
    if let Err(e) = ctx.service.reload() {
        tracing::warn!(error = %e, "Initial reload failed, watching anyway");
    }
    let mut last = ctx.service.snapshot();

    let scheduler = ctx
        .service
        .start_scheduler()
        .context("Failed to start reload scheduler")?;
    if let Some(interval) = args.interval {
        scheduler.set_interval(interval);
    }
    scheduler.enable();

    if !ctx.quiet {
        eprintln!(
            "Watching {} folders every {} (Ctrl+C to stop)",
            ctx.service.folder_names().len(),
            humantime::format_duration(scheduler.interval())
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let baseline = finished_reloads(ctx);
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        // Reloads publish before they are counted; read counters first.
        let reloads = finished_reloads(ctx) - baseline;

        let current = ctx.service.snapshot();
        if current.generation() != last.generation() {
            for change in diff(&last, &current) {
                print_change(&change, args.format)?;
            }
            last = current;
        }

        if args.count.is_some_and(|count| reloads >= count) {
            break;
        }
    }

    scheduler.shutdown();

    if !ctx.quiet {
        let stats = ctx.service.stats().snapshot();
        eprintln!(
            "Stopped after {} reload(s): {} succeeded, {} failed, {} tick(s) dropped",
            stats.attempted, stats.succeeded, stats.failed, stats.ticks_dropped
        );
    }
    Ok(())
}

/// Reloads that ran to completion, successfully or not.
fn finished_reloads(ctx: &CommandContext<'_>) -> u64 {
    let stats = ctx.service.stats().snapshot();
    stats.succeeded + stats.failed
}

fn diff(old: &FolderSnapshot, new: &FolderSnapshot) -> Vec<Change> {
    let empty = FolderEntries::new();
    let before = if old.generation() == 0 { &empty } else { old.as_map() };

    let mut changes: Vec<Change> = new
        .as_map()
        .iter()
        .filter(|(name, path)| before.get(*name) != Some(*path))
        .map(|(name, path)| Change {
            generation: new.generation(),
            name: name.clone(),
            old: before.get(name).cloned().flatten(),
            new: path.clone(),
        })
        .collect();

    changes.extend(
        before
            .iter()
            .filter(|(name, _)| !new.as_map().contains_key(*name))
            .map(|(name, path)| Change {
                generation: new.generation(),
                name: name.clone(),
                old: path.clone(),
                new: None,
            }),
    );
    changes
}

fn print_change(change: &Change, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(change)?),
        OutputFormat::Table => println!(
            "[gen {}] {}: {} -> {}",
            change.generation,
            change.name,
            output::display_path(change.old.as_deref()),
            output::display_path(change.new.as_deref()),
        ),
    }
    Ok(())
}
