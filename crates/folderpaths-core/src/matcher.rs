//! Longest-prefix matching of paths against a folder snapshot.
//!
//! Matching is a pure function of its arguments: it reads a snapshot and
//! never reloads, locks or touches the filesystem.
//!
//! Ranking rules:
//! 1. An entry matches if the input equals its path or lies below it on a
//!    segment boundary (`/u/docs2` does not lie below `/u/docs`).
//! 2. The longest normalized folder path wins.
//! 3. Equal lengths (two names for the same physical folder) are broken by
//!    ascending logical name, so the result never depends on load order.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::normalize::{CaseSensitivity, NormalizedPath};
use crate::path_table::FolderSnapshot;

/// The folder a path was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderMatch {
    /// Logical name of the matched folder.
    pub name: String,
    /// The folder's path as stored in the snapshot.
    pub path: PathBuf,
    /// The path that was matched.
    pub input: PathBuf,
}

impl FolderMatch {
    /// The input's location relative to the matched folder.
    ///
    /// Empty when the input is the folder itself. Segments keep the input's
    /// spelling even when `case` folds for comparison. `None` only if either
    /// path cannot be normalized.
    pub fn relative_part(&self, case: CaseSensitivity) -> Option<String> {
        let depth = NormalizedPath::new(&self.path, case).ok()?.segments().count();
        let input = NormalizedPath::new(&self.input, CaseSensitivity::Sensitive).ok()?;
        Some(input.segments().skip(depth).collect::<Vec<_>>().join("/"))
    }
}

struct Candidate<'a> {
    name: &'a str,
    path: &'a Path,
    normalized_len: usize,
}

impl Candidate<'_> {
    /// Best first: longer path, then smaller name.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .normalized_len
            .cmp(&self.normalized_len)
            .then_with(|| self.name.cmp(other.name))
    }
}

/// Returns every folder containing `candidate`, best match first.
///
/// Fails with `InvalidArgument` if `candidate` is empty or relative. Entries
/// whose stored path cannot be normalized are skipped.
pub fn matching_folders(
    candidate: &Path,
    snapshot: &FolderSnapshot,
    case: CaseSensitivity,
) -> Result<Vec<FolderMatch>> {
    let input = NormalizedPath::new(candidate, case)?;

    let mut candidates: Vec<Candidate<'_>> = snapshot
        .iter()
        .filter_map(|(name, path)| {
            let path = path?;
            let normalized = match NormalizedPath::new(path, case) {
                Ok(normalized) => normalized,
                Err(e) => {
                    tracing::trace!(folder = name, error = %e, "Skipping unmatchable folder path");
                    return None;
                }
            };
            normalized.contains(&input).then(|| Candidate {
                name,
                path,
                normalized_len: normalized.len(),
            })
        })
        .collect();

    candidates.sort_by(Candidate::rank);

    Ok(candidates
        .into_iter()
        .map(|c| FolderMatch {
            name: c.name.to_string(),
            path: c.path.to_path_buf(),
            input: candidate.to_path_buf(),
        })
        .collect())
}

/// Finds the most specific folder containing `candidate`.
///
/// Returns `Ok(None)` when no known folder contains the path; that is a
/// normal negative result, not an error.
///
/// # Example
///
/// ```
/// use folderpaths_core::matcher::match_best_special_folder;
/// use folderpaths_core::path_table::{FolderEntries, FolderSnapshot};
/// use folderpaths_core::CaseSensitivity;
/// use std::path::{Path, PathBuf};
///
/// let mut entries = FolderEntries::new();
/// entries.insert("Documents".into(), Some(PathBuf::from("/u/docs")));
/// entries.insert("Projects".into(), Some(PathBuf::from("/u/docs/proj")));
/// let snapshot = FolderSnapshot::from_entries(entries);
///
/// let best = match_best_special_folder(
///     Path::new("/u/docs/proj/x.txt"),
///     &snapshot,
///     CaseSensitivity::Sensitive,
/// )
/// .unwrap()
/// .unwrap();
/// assert_eq!(best.name, "Projects");
/// ```
pub fn match_best_special_folder(
    candidate: &Path,
    snapshot: &FolderSnapshot,
    case: CaseSensitivity,
) -> Result<Option<FolderMatch>> {
    Ok(matching_folders(candidate, snapshot, case)?.into_iter().next())
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::path_table::FolderEntries;
    use proptest::prelude::*;

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-c]{1,2}", 1..5)
    }

    proptest! {
        /// The best match contains the input, and no containing folder is longer.
        #[test]
        fn best_match_is_longest_container(
            folders in prop::collection::vec(segments(), 1..8),
            input in segments(),
        ) {
            let entries: FolderEntries = folders
                .iter()
                .enumerate()
                .map(|(i, segs)| (format!("F{i}"), Some(PathBuf::from(format!("/{}", segs.join("/"))))))
                .collect();
            let snap = FolderSnapshot::from_entries(entries);
            let input_path = PathBuf::from(format!("/{}", input.join("/")));
            let case = CaseSensitivity::Sensitive;
            let normalized_input = NormalizedPath::new(&input_path, case).unwrap();

            let best = match_best_special_folder(&input_path, &snap, case).unwrap();
            let containing: Vec<usize> = snap
                .iter()
                .filter_map(|(_, p)| NormalizedPath::new(p?, case).ok())
                .filter(|n| n.contains(&normalized_input))
                .map(|n| n.len())
                .collect();

            match best {
                None => prop_assert!(containing.is_empty()),
                Some(found) => {
                    let found_norm = NormalizedPath::new(&found.path, case).unwrap();
                    prop_assert!(found_norm.contains(&normalized_input));
                    prop_assert_eq!(Some(found_norm.len()), containing.iter().copied().max());
                }
            }
        }
    }
}
