//! Stats command: run reloads and report the counters.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use super::CommandContext;
use crate::output::{self, OutputFormat};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Number of reloads to run before reporting
    #[arg(short = 'n', long, default_value = "1")]
    pub reloads: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[instrument(level = "info", name = "cmd::stats", skip_all)]
pub fn execute(ctx: &CommandContext<'_>, args: &Args) -> Result<()> {
    for _ in 0..args.reloads {
        if let Err(e) = ctx.service.reload() {
            tracing::warn!(error = %e, "Reload failed");
        }
    }

    let snapshot = ctx.service.snapshot();
    let stats = ctx.service.stats().snapshot();

    match args.format {
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({
                "config": ctx.source.describe(),
                "case_sensitivity": ctx.service.case_sensitivity(),
                "generation": snapshot.generation(),
                "folders": snapshot.len(),
                "resolved": snapshot.resolved_count(),
                "stats": stats,
            }))?;
        }
        OutputFormat::Table => {
            println!("Config: {}", ctx.source.describe());
            println!(
                "Snapshot: generation {}, {}/{} folders resolved",
                snapshot.generation(),
                snapshot.resolved_count(),
                snapshot.len()
            );
            println!();

            let mut table = output::table(ctx.color, &["Metric", "Value"]);
            table.add_row(vec!["Reloads attempted".to_string(), stats.attempted.to_string()]);
            table.add_row(vec!["Reloads succeeded".to_string(), stats.succeeded.to_string()]);
            table.add_row(vec!["Reloads failed".to_string(), stats.failed.to_string()]);
            table.add_row(vec!["Coalesced callers".to_string(), stats.coalesced.to_string()]);
            table.add_row(vec![
                "Last duration".to_string(),
                stats
                    .last_duration
                    .map_or_else(|| "-".to_string(), |d| format!("{:.2} ms", d.as_secs_f64() * 1000.0)),
            ]);
            table.add_row(vec![
                "Last error".to_string(),
                stats.last_error.clone().unwrap_or_else(|| "-".to_string()),
            ]);
            println!("{table}");
        }
    }

    Ok(())
}
