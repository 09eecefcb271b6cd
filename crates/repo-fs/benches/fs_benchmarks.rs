use criterion::{Criterion, black_box, criterion_group, criterion_main};
use repo_fs::DirectorySnapshot;
use repo_fs::io;
use std::fs;
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_file.txt");
        let content = "hello world".as_bytes();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content)).unwrap();
        })
    });
}

fn snapshot_capture_benchmark(c: &mut Criterion) {
    c.bench_function("snapshot::DirectorySnapshot::capture (500 files)", |b| {
        let dir = tempdir().unwrap();
        for d in 0..10 {
            let sub = dir.path().join(format!("dir{d}"));
            fs::create_dir_all(&sub).unwrap();
            for f in 0..50 {
                fs::write(sub.join(format!("file{f}.txt")), "x").unwrap();
            }
        }

        b.iter(|| {
            let snapshot = DirectorySnapshot::capture(black_box(dir.path())).unwrap();
            assert_eq!(snapshot.len(), 500);
        })
    });
}

criterion_group!(benches, write_atomic_benchmark, snapshot_capture_benchmark);
criterion_main!(benches);
