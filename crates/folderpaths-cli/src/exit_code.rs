//! Process exit codes.
//!
//! Scripts can branch on these instead of parsing error text.

/// Command completed.
pub const SUCCESS: u8 = 0;

/// Unclassified failure.
pub const GENERAL_ERROR: u8 = 1;

/// Bad command-line usage or an invalid path argument.
pub const USAGE: u8 = 2;

/// At least one path matched no special folder.
pub const NO_MATCH: u8 = 3;

/// Unknown or unresolvable folder name.
pub const NOT_FOUND: u8 = 4;

/// The environment could not be queried (or timed out).
pub const ENVIRONMENT_UNAVAILABLE: u8 = 5;

/// The configuration file is missing or invalid.
pub const CONFIG_INVALID: u8 = 6;

/// Filesystem permission problem while creating a folder.
pub const PERMISSION_DENIED: u8 = 77;

/// Interrupted by the user.
pub const CANCELLED: u8 = 130;
