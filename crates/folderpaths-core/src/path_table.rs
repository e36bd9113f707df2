//! Snapshot-swapping table of special folder paths.
//!
//! # Design
//!
//! The table holds an `Arc` to an immutable [`FolderSnapshot`]. Writers
//! build a complete new snapshot off to the side and publish it with a
//! single pointer swap; readers clone the current `Arc` and work on that
//! point-in-time copy for as long as they like.
//!
//! - Readers never observe a partially built table: there is no per-entry
//!   mutation, only whole-snapshot replacement.
//! - The `RwLock` guards only the pointer, so it is held for the duration of
//!   an `Arc::clone` or an assignment. Provider I/O never happens under it.
//! - Generations are stamped at publication and strictly increase, so a
//!   reader can tell which of two snapshots it saw.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::Serialize;

/// One logical folder and its resolved path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    /// Logical identifier, unique within a snapshot.
    pub name: String,
    /// Absolute path, or `None` if the folder is unresolvable on this host.
    pub path: Option<PathBuf>,
}

/// Mapping from logical name to resolved path, as produced by a reload.
pub type FolderEntries = BTreeMap<String, Option<PathBuf>>;

/// A complete, immutable copy of the name -> path mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSnapshot {
    entries: FolderEntries,
    generation: u64,
    loaded_at: Option<SystemTime>,
}

impl FolderSnapshot {
    /// The empty snapshot a table starts with (generation 0).
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            generation: 0,
            loaded_at: None,
        }
    }

    /// Builds an unpublished snapshot, mainly for matching in tests.
    pub fn from_entries(entries: FolderEntries) -> Self {
        Self {
            entries,
            generation: 0,
            loaded_at: None,
        }
    }

    /// Looks up the path for `name`.
    ///
    /// Returns `None` if the name is unknown, `Some(None)` if it is known but
    /// has no path on this host.
    pub fn get(&self, name: &str) -> Option<Option<&Path>> {
        self.entries.get(name).map(Option::as_deref)
    }

    /// Iterates over `(name, path)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Path>)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_deref()))
    }

    /// Owned entries in name order.
    pub fn entries(&self) -> Vec<FolderEntry> {
        self.entries
            .iter()
            .map(|(name, path)| FolderEntry {
                name: name.clone(),
                path: path.clone(),
            })
            .collect()
    }

    /// The raw mapping.
    pub fn as_map(&self) -> &FolderEntries {
        &self.entries
    }

    /// Publication counter; 0 means never loaded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When this snapshot was published.
    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }

    /// Number of logical names, resolved or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot holds no names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of names that resolved to a path.
    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|p| p.is_some()).count()
    }
}

impl Default for FolderSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Thread-safe holder of the current [`FolderSnapshot`].
///
/// # Example
///
/// ```
/// use folderpaths_core::path_table::{FolderEntries, PathTable};
/// use std::path::PathBuf;
///
/// let table = PathTable::new();
/// assert!(table.get().is_empty());
///
/// let mut entries = FolderEntries::new();
/// entries.insert("Documents".to_string(), Some(PathBuf::from("/u/docs")));
/// let published = table.set(entries);
///
/// assert_eq!(published.generation(), 1);
/// assert_eq!(table.get().len(), 1);
/// ```
#[derive(Debug)]
pub struct PathTable {
    /// Current snapshot pointer.
    current: RwLock<Arc<FolderSnapshot>>,
    /// Last generation handed out.
    generation: AtomicU64,
}

impl PathTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(FolderSnapshot::empty())),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the current snapshot.
    ///
    /// Never fails; an unloaded table yields an empty snapshot.
    #[inline]
    pub fn get(&self) -> Arc<FolderSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Atomically replaces the whole mapping and returns the published
    /// snapshot.
    ///
    /// The generation is stamped while holding the write guard so that
    /// publication order and generation order always agree.
    pub fn set(&self, entries: FolderEntries) -> Arc<FolderSnapshot> {
        let mut current = self.current.write();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(FolderSnapshot {
            entries,
            generation,
            loaded_at: Some(SystemTime::now()),
        });
        *current = Arc::clone(&snapshot);
        snapshot
    }

    /// Generation of the currently published snapshot.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new()
    }
}
