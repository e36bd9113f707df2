//! Subcommand implementations.

pub mod ensure;
pub mod list;
pub mod match_path;
pub mod stats;
pub mod watch;

use clap::ColorChoice;
use folderpaths_core::{FolderPathsService, SpecialFolder};

use crate::config::ConfigSource;

/// Everything a subcommand needs besides its own arguments.
pub struct CommandContext<'a> {
    pub service: &'a FolderPathsService,
    pub source: &'a ConfigSource,
    pub color: ColorChoice,
    pub quiet: bool,
}

/// Maps `documents` to `Documents`; custom names pass through unchanged.
pub fn canonical_name(name: &str) -> String {
    name.parse::<SpecialFolder>()
        .map_or_else(|_| name.to_string(), |folder| folder.name().to_string())
}
