//! Built-in special folder catalogue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A well-known, OS-designated folder whose location varies per host/user.
///
/// The logical name returned by [`SpecialFolder::name`] is the key used in
/// snapshots. Custom folders from configuration use arbitrary names and do
/// not need a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecialFolder {
    /// The user's home directory.
    Home,
    /// Desktop.
    Desktop,
    /// Documents.
    Documents,
    /// Downloads.
    Downloads,
    /// Music.
    Music,
    /// Pictures.
    Pictures,
    /// Videos.
    Videos,
    /// Public / shared files.
    Public,
    /// Document templates.
    Templates,
    /// User-installed fonts.
    Fonts,
    /// Roaming application data (config directory on Unix).
    AppData,
    /// Local, non-roaming application data.
    LocalAppData,
    /// Per-user cache.
    Cache,
    /// Per-user executables.
    Executables,
    /// Temporary files.
    Temp,
}

impl SpecialFolder {
    /// Every built-in folder, in catalogue order.
    pub const ALL: [SpecialFolder; 15] = [
        SpecialFolder::Home,
        SpecialFolder::Desktop,
        SpecialFolder::Documents,
        SpecialFolder::Downloads,
        SpecialFolder::Music,
        SpecialFolder::Pictures,
        SpecialFolder::Videos,
        SpecialFolder::Public,
        SpecialFolder::Templates,
        SpecialFolder::Fonts,
        SpecialFolder::AppData,
        SpecialFolder::LocalAppData,
        SpecialFolder::Cache,
        SpecialFolder::Executables,
        SpecialFolder::Temp,
    ];

    /// The logical name used as snapshot key.
    pub const fn name(self) -> &'static str {
        match self {
            SpecialFolder::Home => "Home",
            SpecialFolder::Desktop => "Desktop",
            SpecialFolder::Documents => "Documents",
            SpecialFolder::Downloads => "Downloads",
            SpecialFolder::Music => "Music",
            SpecialFolder::Pictures => "Pictures",
            SpecialFolder::Videos => "Videos",
            SpecialFolder::Public => "Public",
            SpecialFolder::Templates => "Templates",
            SpecialFolder::Fonts => "Fonts",
            SpecialFolder::AppData => "AppData",
            SpecialFolder::LocalAppData => "LocalAppData",
            SpecialFolder::Cache => "Cache",
            SpecialFolder::Executables => "Executables",
            SpecialFolder::Temp => "Temp",
        }
    }

    /// Iterator over the logical names of every built-in folder.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|f| f.name())
    }
}

impl fmt::Display for SpecialFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is not a built-in folder name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a built-in special folder")]
pub struct UnknownSpecialFolder(pub String);

impl FromStr for SpecialFolder {
    type Err = UnknownSpecialFolder;

    /// Parses a logical name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSpecialFolder(s.to_string()))
    }
}
