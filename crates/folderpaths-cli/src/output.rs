//! Shared output helpers for commands.

use std::io::{self, IsTerminal};
use std::path::Path;

use clap::ColorChoice;
use comfy_table::{Attribute, Cell, Table, presets::UTF8_FULL_CONDENSED};

/// How a command prints its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Placeholder for folders without a path on this host.
pub const UNRESOLVED: &str = "-";

/// Creates a table with the house style and a bold header row.
pub fn table(color: ColorChoice, header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    match color {
        ColorChoice::Always => {
            table.enforce_styling();
        }
        ColorChoice::Never => {
            table.force_no_tty();
        }
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                table.force_no_tty();
            }
        }
    }
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

pub fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| UNRESOLVED.to_string(), |p| p.display().to_string())
}

/// Pretty-printed JSON on stdout.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
