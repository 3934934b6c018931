use std::fs;
use std::path::{Path, PathBuf};

use criterion::{Criterion, criterion_group, criterion_main};
use rooted_fs::ops::{
    Context, DirectoryTreeRequest, ReadFileRequest, SearchFilesRequest, directory_tree, read_file,
    search_files,
};
use rooted_fs::policy::{Permissions, SandboxPolicy};
use rooted_fs::text_edit::{Edit, apply_edits};
use rooted_fs::{AllowedRoots, ExcludeMatcher};

struct BenchFixture {
    _tempdir: tempfile::TempDir,
    root: PathBuf,
    ctx: Context,
    roots: AllowedRoots,
    large_text: String,
}

fn setup_fixture() -> BenchFixture {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let root = tempdir.path().canonicalize().expect("canonicalize");

    let mut large = String::with_capacity(256 * 1024);
    for i in 0..8_000 {
        large.push_str(&format!("    line-{i} normal text and maybe needle-{i}\n"));
    }
    fs::write(root.join("large.txt"), &large).expect("write large file");

    for dir in 0..20 {
        let docs = root.join(format!("docs-{dir}"));
        fs::create_dir_all(docs.join("target")).expect("mkdir docs");
        for i in 0..30 {
            let name = if i % 8 == 0 { "needle" } else { "plain" };
            fs::write(docs.join(format!("{name}-{i}.txt")), "").expect("write txt");
            fs::write(docs.join("target").join(format!("{name}-{i}.o")), "").expect("write obj");
        }
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink("docs-0", root.join("hop-a")).expect("symlink");
        std::os::unix::fs::symlink("hop-a/target", root.join("hop-b")).expect("symlink");
    }

    let ctx = Context::new(SandboxPolicy::from_roots([&root], Permissions::all())).expect("ctx");
    let roots = AllowedRoots::new([&root]).expect("roots");
    BenchFixture {
        _tempdir: tempdir,
        root,
        ctx,
        roots,
        large_text: large,
    }
}

fn validate_target(root: &Path) -> PathBuf {
    if cfg!(unix) {
        root.join("hop-b/needle-0.o")
    } else {
        root.join("docs-0/target/needle-0.o")
    }
}

fn bench_ops(c: &mut Criterion) {
    let fixture = setup_fixture();

    let chained = validate_target(&fixture.root);
    c.bench_function("guard/validate_through_symlink_chain", |b| {
        b.iter(|| fixture.roots.validate(&chained).expect("validate"));
    });
    let missing = fixture.root.join("docs-3/new/dir/file.txt");
    c.bench_function("guard/validate_missing_tail", |b| {
        b.iter(|| fixture.roots.validate(&missing).expect("validate"));
    });

    c.bench_function("read/full_large_file", |b| {
        b.iter(|| {
            read_file(
                &fixture.ctx,
                ReadFileRequest {
                    path: fixture.root.join("large.txt"),
                },
            )
            .expect("read")
        });
    });

    let exact = vec![Edit::new("line-7999 normal", "line-7999 edited")];
    c.bench_function("edit/exact_match_near_end", |b| {
        b.iter(|| apply_edits(&fixture.large_text, &exact).expect("edit"));
    });
    let fuzzy = vec![Edit::new(
        "line-7000 normal text and maybe needle-7000\nline-7001 normal text and maybe needle-7001",
        "line-7000 replaced\n  line-7001 replaced",
    )];
    c.bench_function("edit/whitespace_insensitive_match", |b| {
        b.iter(|| apply_edits(&fixture.large_text, &fuzzy).expect("edit"));
    });

    let matcher = ExcludeMatcher::new(["target/", "**/node_modules", "docs-1/**", "*.log"])
        .expect("matcher");
    c.bench_function("exclude/relative_match", |b| {
        b.iter(|| matcher.is_excluded_relative("docs-7/target/plain-3.o", false));
    });

    c.bench_function("search/needle_with_excludes", |b| {
        b.iter(|| {
            search_files(
                &fixture.ctx,
                SearchFilesRequest {
                    path: fixture.root.clone(),
                    pattern: "needle".to_string(),
                    exclude_patterns: vec!["target/".to_string()],
                },
            )
            .expect("search")
        });
    });

    c.bench_function("tree/full_depth", |b| {
        b.iter(|| {
            directory_tree(
                &fixture.ctx,
                DirectoryTreeRequest {
                    path: fixture.root.clone(),
                    max_depth: None,
                    exclude_patterns: Vec::new(),
                },
            )
            .expect("tree")
        });
    });
}

criterion_group!(benches, bench_ops);
criterion_main!(benches);
