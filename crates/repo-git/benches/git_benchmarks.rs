use criterion::{Criterion, criterion_group, criterion_main};
use repo_git::{GitMirror, RefProbe};
use repo_test_utils::git::{clone_url, source_repo};
use tempfile::tempdir;

fn benchmark_mirror_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("git_mirror");

    group.bench_function("clone", |b| {
        b.iter_with_setup(
            || {
                let dir = tempdir().unwrap();
                let source = dir.path().join("source");
                std::fs::create_dir_all(&source).unwrap();
                source_repo(&source);
                let mirror = GitMirror::new(clone_url(&source), dir.path().join("mirror"));
                (dir, mirror)
            },
            |(_dir, mirror)| {
                mirror.sync().unwrap();
            },
        );
    });

    let dir = tempdir().unwrap();
    let source = dir.path().join("source");
    std::fs::create_dir_all(&source).unwrap();
    source_repo(&source);
    let mirror = GitMirror::new(clone_url(&source), dir.path().join("mirror"));
    mirror.sync().unwrap();

    group.bench_function("update_up_to_date", |b| {
        b.iter(|| mirror.sync().unwrap());
    });

    let probe = RefProbe::new(clone_url(&source));
    group.bench_function("probe_list", |b| {
        b.iter(|| probe.list().unwrap());
    });

    group.finish();
}

criterion_group!(benches, benchmark_mirror_operations);
criterion_main!(benches);
