//! Lexical path normalization for prefix matching.
//!
//! Normalization never touches the filesystem, so it cannot block on slow
//! or unreachable volumes. It accepts both Unix and Windows spellings:
//!
//! - `\` is converted to the canonical `/` separator
//! - repeated separators collapse, `.` segments drop, `..` pops a segment
//!   (clamped at the root)
//! - trailing separators are stripped, except for a bare root
//! - drive letters are upper-cased, everything is lower-cased when the
//!   comparison is case-insensitive
//!
//! Absolute forms: `/x`, `\\server\share` (UNC) and `C:/x`. A leading `//`
//! is UNC only on Windows; elsewhere extra leading slashes collapse to `/`.
//! Anything else, including drive-relative `C:x`, is relative and rejected,
//! as are paths that are not valid UTF-8.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolderPathsError, Result};

/// How path comparison treats letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    /// Byte-exact comparison.
    Sensitive,
    /// Unicode lower-case folding before comparison.
    Insensitive,
    /// Insensitive on Windows and macOS, sensitive elsewhere.
    #[default]
    Host,
}

impl CaseSensitivity {
    /// Returns true if paths must be case-folded before comparison.
    pub fn folds_case(self) -> bool {
        match self {
            CaseSensitivity::Sensitive => false,
            CaseSensitivity::Insensitive => true,
            CaseSensitivity::Host => cfg!(any(windows, target_os = "macos")),
        }
    }
}

/// A lexically normalized absolute path, ready for prefix comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    text: String,
    root_len: usize,
}

impl NormalizedPath {
    /// Normalizes `path` under the given case policy.
    ///
    /// Fails with [`FolderPathsError::InvalidArgument`] if the path is empty,
    /// not absolute or not valid UTF-8.
    pub fn new(path: &Path, case: CaseSensitivity) -> Result<Self> {
        // Lossy conversion would map distinct byte paths to the same text.
        let raw = path
            .to_str()
            .ok_or_else(|| FolderPathsError::invalid(path.to_string_lossy(), "path is not valid UTF-8"))?;
        if raw.trim().is_empty() {
            return Err(FolderPathsError::invalid(raw, "path is empty"));
        }

        let unc = is_unc(raw);
        let unified = raw.replace('\\', "/");
        let (prefix, rest) = split_root(&unified, unc)
            .ok_or_else(|| FolderPathsError::invalid(raw, "path is not absolute"))?;

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        let mut normalized = String::with_capacity(unified.len());
        normalized.push_str(&prefix);
        normalized.push_str(&segments.join("/"));

        if case.folds_case() {
            normalized = normalized.to_lowercase();
        }

        Ok(Self {
            text: normalized,
            root_len: prefix.len(),
        })
    }

    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The root prefix: `/`, `//` or `C:/`.
    pub fn root(&self) -> &str {
        &self.text[..self.root_len]
    }

    /// Path segments below the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.text[self.root_len..].split('/').filter(|s| !s.is_empty())
    }

    /// Length in bytes, used to rank matches by specificity.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false: a normalized path contains at least its root.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns true if `self` equals `other` or is a segment-aligned
    /// ancestor of it.
    ///
    /// `/u/docs` contains `/u/docs/x` but not `/u/docs2/x`.
    pub fn contains(&self, other: &NormalizedPath) -> bool {
        let base = self.as_str();
        let candidate = other.as_str();
        if !candidate.starts_with(base) {
            return false;
        }
        // Roots ("/", "C:/") already end with the separator.
        base.ends_with('/')
            || candidate.len() == base.len()
            || candidate.as_bytes()[base.len()] == b'/'
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// True if `raw` starts with exactly two separators followed by a server
/// name. Forward slashes only count on Windows; POSIX treats `//x` as `/x`.
fn is_unc(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let separator = |b: u8| b == b'\\' || b == b'/';
    if bytes.len() < 3 || !separator(bytes[0]) || !separator(bytes[1]) || separator(bytes[2]) {
        return false;
    }
    cfg!(windows) || bytes[..2] == *b"\\\\"
}

/// Splits a `/`-separated path into its root prefix and the remainder.
///
/// Returns `None` for relative paths.
fn split_root(path: &str, unc: bool) -> Option<(String, &str)> {
    if unc {
        return path.strip_prefix("//").map(|rest| ("//".to_string(), rest));
    }
    if let Some(rest) = path.strip_prefix('/') {
        return Some(("/".to_string(), rest.trim_start_matches('/')));
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/' {
        let drive = (bytes[0] as char).to_ascii_uppercase();
        return Some((format!("{drive}:/"), &path[3..]));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(path: &str) -> String {
        NormalizedPath::new(Path::new(path), CaseSensitivity::Sensitive)
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn test_strips_trailing_and_repeated_separators() {
        assert_eq!(norm("/u//docs///"), "/u/docs");
        assert_eq!(norm("/"), "/");
        assert_eq!(norm("///"), "/");
    }

    #[test]
    fn test_leading_double_slash() {
        assert_eq!(norm(r"\\server\share"), "//server/share");
        assert_eq!(norm("///u/docs"), "/u/docs");
        if cfg!(windows) {
            assert_eq!(norm("//server/share"), "//server/share");
        } else {
            assert_eq!(norm("//u/docs/x.txt"), "/u/docs/x.txt");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/u/\xff"));
        let err = NormalizedPath::new(path, CaseSensitivity::Sensitive).unwrap_err();
        assert!(matches!(err, FolderPathsError::InvalidArgument { .. }));
    }

    #[test]
    fn test_segments_skip_root() {
        let n = NormalizedPath::new(Path::new(r"C:\Users\Ann"), CaseSensitivity::Sensitive).unwrap();
        assert_eq!(n.root(), "C:/");
        assert_eq!(n.segments().collect::<Vec<_>>(), vec!["Users", "Ann"]);
        let root = NormalizedPath::new(Path::new("/"), CaseSensitivity::Sensitive).unwrap();
        assert_eq!(root.segments().count(), 0);
    }

    #[test]
    fn test_resolves_dot_segments_lexically() {
        assert_eq!(norm("/u/./docs/../pics"), "/u/pics");
        assert_eq!(norm("/../../etc"), "/etc");
    }

    #[test]
    fn test_windows_forms() {
        assert_eq!(norm(r"c:\Users\Ann\Documents\"), "C:/Users/Ann/Documents");
        assert_eq!(norm(r"\\server\share\dir"), "//server/share/dir");
        assert_eq!(norm("C:/"), "C:/");
    }

    #[test]
    fn test_rejects_empty_and_relative() {
        for bad in ["", "   ", "docs/x", "./x", "C:x", "C:"] {
            let err = NormalizedPath::new(Path::new(bad), CaseSensitivity::Sensitive).unwrap_err();
            assert!(
                matches!(err, FolderPathsError::InvalidArgument { .. }),
                "{bad:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_case_folding() {
        let folded = NormalizedPath::new(Path::new("/U/Docs"), CaseSensitivity::Insensitive).unwrap();
        assert_eq!(folded.as_str(), "/u/docs");
        let exact = NormalizedPath::new(Path::new("/U/Docs"), CaseSensitivity::Sensitive).unwrap();
        assert_eq!(exact.as_str(), "/U/Docs");
    }

    #[test]
    fn test_contains_is_segment_aligned() {
        let n = |p: &str| NormalizedPath::new(Path::new(p), CaseSensitivity::Sensitive).unwrap();
        assert!(n("/u/docs").contains(&n("/u/docs")));
        assert!(n("/u/docs").contains(&n("/u/docs/x.txt")));
        assert!(!n("/u/docs").contains(&n("/u/docs2/x.txt")));
        assert!(!n("/u/docs/x").contains(&n("/u/docs")));
        assert!(n("/").contains(&n("/var/tmp")));
        assert!(n("C:/").contains(&n("C:/Users")));
    }
}
