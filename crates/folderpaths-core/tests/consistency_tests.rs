//! Snapshot consistency under concurrent readers and reloads.
//!
//! Focus areas:
//! - Readers never observe a mix of two reloads
//! - Generations observed by one reader never go backwards
//! - Concurrent reload callers share a single provider pass

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use folderpaths_core::{
    CaseSensitivity, EnvironmentProvider, PathTable, ProviderError, Reloader,
    match_best_special_folder, testing::FakeEnvironment,
};
use proptest::prelude::*;

/// Answers `/gen{N}/{name}` for every name, where N only changes between
/// reloads.
#[derive(Debug, Default)]
struct GenerationEnvironment {
    generation: AtomicU64,
}

impl EnvironmentProvider for GenerationEnvironment {
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError> {
        let generation = self.generation.load(Ordering::SeqCst);
        Ok(Some(PathBuf::from(format!("/gen{generation}/{name}"))))
    }

    fn environment_variable(&self, _name: &str) -> Option<String> {
        None
    }
}

fn folder_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Folder{i}")).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn snapshots_never_interleave(folders in 1usize..6, reloads in 1usize..25, readers in 1usize..4) {
        let env = Arc::new(GenerationEnvironment::default());
        let reloader = Arc::new(Reloader::new(
            Arc::clone(&env) as Arc<dyn EnvironmentProvider>,
            folder_names(folders),
            Arc::new(PathTable::new()),
            Duration::from_secs(5),
        ));
        let done = Arc::new(AtomicBool::new(false));

        let reader_handles: Vec<_> = (0..readers)
            .map(|_| {
                let table = Arc::clone(reloader.table());
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut last_generation = 0;
                    loop {
                        let finished = done.load(Ordering::SeqCst);
                        let snapshot = table.get();
                        assert!(snapshot.generation() >= last_generation);
                        last_generation = snapshot.generation();

                        let prefixes: std::collections::BTreeSet<String> = snapshot
                            .iter()
                            .filter_map(|(_, path)| path)
                            .filter_map(|path| path.iter().nth(1))
                            .map(|segment| segment.to_string_lossy().into_owned())
                            .collect();
                        assert!(prefixes.len() <= 1, "mixed snapshot: {prefixes:?}");

                        if finished {
                            break;
                        }
                    }
                })
            })
            .collect();

        for generation in 1..=reloads as u64 {
            env.generation.store(generation, Ordering::SeqCst);
            let summary = reloader.reload().unwrap();
            prop_assert_eq!(summary.resolved, folders);
        }
        done.store(true, Ordering::SeqCst);

        for handle in reader_handles {
            handle.join().unwrap();
        }

        let last = reloader.table().get();
        prop_assert_eq!(last.generation(), reloads as u64);
        let expected = PathBuf::from(format!("/gen{reloads}/Folder0"));
        prop_assert_eq!(last.get("Folder0"), Some(Some(expected.as_path())));
    }

    #[test]
    fn matches_reflect_a_single_generation(reloads in 1usize..15) {
        let env = Arc::new(GenerationEnvironment::default());
        let reloader = Arc::new(Reloader::new(
            Arc::clone(&env) as Arc<dyn EnvironmentProvider>,
            folder_names(3),
            Arc::new(PathTable::new()),
            Duration::from_secs(5),
        ));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let table = Arc::clone(reloader.table());
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = table.get();
                    let generation = snapshot.generation();
                    let input = PathBuf::from(format!("/gen{generation}/Folder2/file.txt"));
                    let found = match_best_special_folder(&input, &snapshot, CaseSensitivity::Sensitive)
                        .unwrap();
                    if generation > 0 {
                        assert_eq!(found.map(|m| m.name).as_deref(), Some("Folder2"));
                    } else {
                        assert!(found.is_none());
                    }
                }
            })
        };

        for generation in 1..=reloads as u64 {
            env.generation.store(generation, Ordering::SeqCst);
            reloader.reload().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        reader.join().unwrap();
    }
}

#[test]
fn test_many_concurrent_callers_share_one_pass() {
    let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
    let reloader = Arc::new(Reloader::new(
        Arc::clone(&env) as Arc<dyn EnvironmentProvider>,
        vec!["Documents".into(), "Music".into()],
        Arc::new(PathTable::new()),
        Duration::from_secs(5),
    ));
    env.pause();

    let leader = {
        let reloader = Arc::clone(&reloader);
        thread::spawn(move || reloader.reload())
    };
    while env.blocked_queries() == 0 {
        thread::sleep(Duration::from_millis(1));
    }

    let followers: Vec<_> = (0..8)
        .map(|_| {
            let reloader = Arc::clone(&reloader);
            thread::spawn(move || reloader.reload())
        })
        .collect();
    while reloader.stats().coalesced() < 8 {
        thread::sleep(Duration::from_millis(1));
    }
    env.resume();

    let leader = leader.join().unwrap().unwrap();
    for follower in followers {
        let summary = follower.join().unwrap().unwrap();
        assert!(summary.coalesced);
        assert_eq!(summary.generation, leader.generation);
    }

    // One query per configured name, no matter how many callers.
    assert_eq!(env.query_count(), 2);
    assert_eq!(reloader.stats().attempted(), 1);
}

#[test]
fn test_coalesced_callers_share_failure() {
    let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
    env.set_unreachable(true);
    let reloader = Arc::new(Reloader::new(
        Arc::clone(&env) as Arc<dyn EnvironmentProvider>,
        vec!["Documents".into()],
        Arc::new(PathTable::new()),
        Duration::from_secs(5),
    ));
    env.pause();

    let leader = {
        let reloader = Arc::clone(&reloader);
        thread::spawn(move || reloader.reload())
    };
    while env.blocked_queries() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    let follower = {
        let reloader = Arc::clone(&reloader);
        thread::spawn(move || reloader.reload())
    };
    while reloader.stats().coalesced() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    env.resume();

    let leader = leader.join().unwrap().unwrap_err();
    let follower = follower.join().unwrap().unwrap_err();
    assert_eq!(leader, follower);
    assert!(leader.is_environment_unavailable());
    assert_eq!(reloader.table().generation(), 0);
}
