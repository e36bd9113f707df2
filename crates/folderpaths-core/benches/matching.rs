use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use folderpaths_core::path_table::FolderEntries;
use folderpaths_core::{
    CaseSensitivity, EnvironmentProvider, FolderSnapshot, NormalizedPath, PathTable, Reloader,
    match_best_special_folder, testing::FakeEnvironment,
};
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn snapshot_with_folders(n: usize) -> FolderSnapshot {
    let entries: FolderEntries = (0..n)
        .map(|i| {
            let depth = i % 4;
            let mut path = PathBuf::from("/home/user");
            for level in 0..=depth {
                path.push(format!("level{level}_{}", i / 4));
            }
            (format!("Folder{i:03}"), Some(path))
        })
        .collect();
    FolderSnapshot::from_entries(entries)
}

fn bench_best_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_best_special_folder");

    for size in [15, 100, 1000] {
        let snapshot = snapshot_with_folders(size);
        let input = Path::new("/home/user/level0_3/level1_3/level2_3/notes/today.md");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let found =
                    match_best_special_folder(black_box(input), &snapshot, CaseSensitivity::Sensitive);
                let _ = black_box(found);
            });
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let inputs = [
        ("unix", r"/home/user/./Documents//reports/../q3.xlsx"),
        ("windows", r"C:\Users\Ann\AppData\Roaming\..\Local\Temp\x.tmp"),
        ("unc", r"\\fileserver\share\Team\Docs\plan.docx"),
    ];

    for (label, input) in inputs {
        for case in [CaseSensitivity::Sensitive, CaseSensitivity::Insensitive] {
            let id = format!("{label}/{case:?}");
            group.bench_function(id, |b| {
                b.iter(|| {
                    let normalized = NormalizedPath::new(black_box(Path::new(input)), case);
                    let _ = black_box(normalized);
                });
            });
        }
    }
    group.finish();
}

fn bench_snapshot_read(c: &mut Criterion) {
    let table = PathTable::new();
    table.set(snapshot_with_folders(100).as_map().clone());

    c.bench_function("path_table_get", |b| {
        b.iter(|| black_box(table.get()));
    });
}

fn bench_reload(c: &mut Criterion) {
    let mut env = FakeEnvironment::new();
    for folder in folderpaths_core::SpecialFolder::ALL {
        env = env.with_folder(folder.name(), format!("/home/user/{}", folder.name()));
    }
    let reloader = Reloader::new(
        Arc::new(env) as Arc<dyn EnvironmentProvider>,
        folderpaths_core::SpecialFolder::all_names().map(String::from).collect(),
        Arc::new(PathTable::new()),
        Duration::from_secs(5),
    );

    c.bench_function("reload_builtin_catalogue", |b| {
        b.iter(|| black_box(reloader.reload()));
    });
}

criterion_group!(
    benches,
    bench_best_match,
    bench_normalize,
    bench_snapshot_read,
    bench_reload
);
criterion_main!(benches);
