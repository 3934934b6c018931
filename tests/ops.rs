mod common;

use std::fs;
use std::io::ErrorKind;

use common::{canonical_tempdir, test_context, test_policy};
use rooted_fs::ops::{
    Context, CreateDirectoryRequest, DirectoryTreeRequest, EntryKind, FileInfoRequest,
    ListDirectoryRequest, MoveFileRequest, ReadFileRequest, ReadMultipleFilesRequest,
    SearchFilesRequest, TreeEntryType, WriteFileRequest,
};
use rooted_fs::{Error, Permissions, SandboxPolicy};

#[test]
fn read_returns_content_and_enforces_the_limit() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("a.txt"), "hello\n").expect("write");
    fs::write(root.join("big.txt"), "0123456789").expect("write");

    let mut policy = test_policy(&root);
    policy.limits.max_read_bytes = 8;
    let ctx = Context::new(policy).expect("ctx");

    let response = ctx
        .read_file(ReadFileRequest {
            path: root.join("a.txt"),
        })
        .expect("read");
    assert_eq!(response.content, "hello\n");
    assert_eq!(response.path, root.join("a.txt"));

    match ctx.read_file(ReadFileRequest {
        path: root.join("big.txt"),
    }) {
        Err(Error::FileTooLarge { max_bytes, .. }) => assert_eq!(max_bytes, 8),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn read_many_reports_failures_per_path() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("a.txt"), "a").expect("write");
    fs::write(root.join("b.txt"), "b").expect("write");
    let ctx = test_context(&root);

    let response = ctx
        .read_multiple_files(ReadMultipleFilesRequest {
            paths: vec![
                root.join("a.txt"),
                root.join("missing.txt"),
                root.join("../elsewhere.txt"),
                root.join("b.txt"),
            ],
        })
        .expect("read many");

    assert_eq!(response.files.len(), 4);
    assert_eq!(response.files[0].content.as_deref(), Some("a"));
    assert!(response.files[1].content.is_none());
    assert_eq!(response.files[1].error_code.as_deref(), Some("io"));
    assert!(
        response.files[2]
            .error
            .as_deref()
            .is_some_and(|msg| msg.starts_with("access denied"))
    );
    assert_eq!(response.files[3].content.as_deref(), Some("b"));
    assert_eq!(response.files[1].path, root.join("missing.txt"));
}

#[test]
fn read_many_rejects_too_many_paths() {
    let (_dir, root) = canonical_tempdir();
    let mut policy = test_policy(&root);
    policy.limits.max_read_many = 1;
    let ctx = Context::new(policy).expect("ctx");

    match ctx.read_multiple_files(ReadMultipleFilesRequest {
        paths: vec![root.join("a"), root.join("b")],
    }) {
        Err(Error::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn write_creates_then_replaces() {
    let (_dir, root) = canonical_tempdir();
    let ctx = test_context(&root);
    let path = root.join("out.txt");

    let first = ctx
        .write_file(WriteFileRequest {
            path: path.clone(),
            content: "one".to_string(),
        })
        .expect("create");
    assert!(first.created);
    assert_eq!(first.bytes_written, 3);

    let second = ctx
        .write_file(WriteFileRequest {
            path: path.clone(),
            content: "second".to_string(),
        })
        .expect("replace");
    assert!(!second.created);
    assert_eq!(fs::read_to_string(&path).expect("read"), "second");
}

#[test]
fn write_refuses_directories_and_oversized_content() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir(root.join("sub")).expect("mkdir");
    let mut policy = test_policy(&root);
    policy.limits.max_write_bytes = 4;
    let ctx = Context::new(policy).expect("ctx");

    match ctx.write_file(WriteFileRequest {
        path: root.join("sub"),
        content: "x".to_string(),
    }) {
        Err(Error::InvalidPath(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    match ctx.write_file(WriteFileRequest {
        path: root.join("big.txt"),
        content: "too long".to_string(),
    }) {
        Err(Error::FileTooLarge { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!root.join("big.txt").exists());
}

#[test]
fn create_directory_makes_parents_and_is_idempotent() {
    let (_dir, root) = canonical_tempdir();
    let ctx = test_context(&root);
    let nested = root.join("a/b/c");

    let response = ctx
        .create_directory(CreateDirectoryRequest {
            path: nested.clone(),
        })
        .expect("mkdir");
    assert!(response.created);
    assert!(nested.is_dir());

    let again = ctx
        .create_directory(CreateDirectoryRequest { path: nested })
        .expect("mkdir again");
    assert!(!again.created);

    fs::write(root.join("file"), "x").expect("write");
    match ctx.create_directory(CreateDirectoryRequest {
        path: root.join("file"),
    }) {
        Err(Error::InvalidPath(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn list_directory_is_sorted_and_typed() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("b.txt"), "b").expect("write");
    fs::create_dir(root.join("a")).expect("mkdir");
    fs::write(root.join("c.txt"), "c").expect("write");
    let ctx = test_context(&root);

    let response = ctx
        .list_directory(ListDirectoryRequest { path: root.clone() })
        .expect("list");
    let names: Vec<(&str, EntryKind)> = response
        .entries
        .iter()
        .map(|entry| (entry.name.as_str(), entry.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("a", EntryKind::Dir),
            ("b.txt", EntryKind::File),
            ("c.txt", EntryKind::File),
        ]
    );

    match ctx.list_directory(ListDirectoryRequest {
        path: root.join("b.txt"),
    }) {
        Err(Error::InvalidPath(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn directory_tree_nests_and_respects_depth() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("src/nested")).expect("mkdir");
    fs::write(root.join("src/lib.rs"), "").expect("write");
    fs::write(root.join("src/nested/deep.rs"), "").expect("write");
    fs::write(root.join("README.md"), "").expect("write");
    fs::create_dir(root.join("empty")).expect("mkdir");
    let ctx = test_context(&root);

    let full = ctx
        .directory_tree(DirectoryTreeRequest {
            path: root.clone(),
            max_depth: None,
            exclude_patterns: Vec::new(),
        })
        .expect("tree");
    assert!(!full.truncated);
    let names: Vec<&str> = full.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["README.md", "empty", "src"]);
    assert_eq!(full.entries[0].kind, TreeEntryType::File);
    assert_eq!(full.entries[0].children, None);
    assert_eq!(full.entries[1].children, Some(Vec::new()));
    let src = full.entries[2].children.as_ref().expect("src children");
    assert_eq!(src[0].name, "lib.rs");
    assert_eq!(src[1].name, "nested");
    let nested = src[1].children.as_ref().expect("nested children");
    assert_eq!(nested[0].name, "deep.rs");

    let shallow = ctx
        .directory_tree(DirectoryTreeRequest {
            path: root.clone(),
            max_depth: Some(1),
            exclude_patterns: Vec::new(),
        })
        .expect("shallow tree");
    assert_eq!(shallow.entries.len(), 3);
    assert_eq!(shallow.entries[1].children, Some(Vec::new()));
    let src = shallow.entries[2].children.as_ref().expect("src children");
    let names: Vec<&str> = src.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["lib.rs", "nested"]);
    assert_eq!(src[1].kind, TreeEntryType::Directory);
    assert_eq!(src[1].children, None);

    match ctx.directory_tree(DirectoryTreeRequest {
        path: root.clone(),
        max_depth: Some(0),
        exclude_patterns: Vec::new(),
    }) {
        Err(Error::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn directory_tree_omits_children_below_depth_cut() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("a/b")).expect("mkdir");
    fs::write(root.join("a/b/f.txt"), "").expect("write");
    let ctx = test_context(&root);

    let response = ctx
        .directory_tree(DirectoryTreeRequest {
            path: root.clone(),
            max_depth: Some(1),
            exclude_patterns: Vec::new(),
        })
        .expect("tree");
    let json = serde_json::to_value(&response.entries).expect("json");
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "a", "type": "directory", "children": [
                {"name": "b", "type": "directory"},
            ]},
        ])
    );
}

#[test]
fn directory_tree_serializes_type_and_children() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir(root.join("d")).expect("mkdir");
    fs::write(root.join("f"), "").expect("write");
    let ctx = test_context(&root);

    let response = ctx
        .directory_tree(DirectoryTreeRequest {
            path: root.clone(),
            max_depth: None,
            exclude_patterns: Vec::new(),
        })
        .expect("tree");
    let json = serde_json::to_value(&response.entries).expect("json");
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "d", "type": "directory", "children": []},
            {"name": "f", "type": "file"},
        ])
    );
}

#[test]
fn directory_tree_truncates_at_walk_limit() {
    let (_dir, root) = canonical_tempdir();
    for name in ["a", "b", "c", "d"] {
        fs::write(root.join(name), "").expect("write");
    }
    let mut policy = test_policy(&root);
    policy.limits.max_walk_entries = 2;
    let ctx = Context::new(policy).expect("ctx");

    let response = ctx
        .directory_tree(DirectoryTreeRequest {
            path: root.clone(),
            max_depth: None,
            exclude_patterns: Vec::new(),
        })
        .expect("tree");
    assert!(response.truncated);
    assert_eq!(response.entries.len(), 2);
}

#[test]
fn move_file_renames_and_refuses_to_overwrite() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("from.txt"), "payload").expect("write");
    fs::write(root.join("taken.txt"), "keep").expect("write");
    let ctx = test_context(&root);

    let err = ctx
        .move_file(MoveFileRequest {
            source: root.join("from.txt"),
            destination: root.join("taken.txt"),
        })
        .expect_err("destination exists");
    match err {
        Error::Io(io) => assert_eq!(io.kind(), ErrorKind::AlreadyExists),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(root.join("taken.txt")).expect("read"),
        "keep"
    );

    let response = ctx
        .move_file(MoveFileRequest {
            source: root.join("from.txt"),
            destination: root.join("to.txt"),
        })
        .expect("move");
    assert_eq!(response.kind, EntryKind::File);
    assert!(!root.join("from.txt").exists());
    assert_eq!(
        fs::read_to_string(root.join("to.txt")).expect("read"),
        "payload"
    );
}

#[test]
fn move_file_checks_both_ends_and_roots() {
    let (_dir, base) = canonical_tempdir();
    let root = base.join("root");
    fs::create_dir(&root).expect("mkdir");
    fs::write(root.join("inside.txt"), "x").expect("write");
    let ctx = test_context(&root);

    let err = ctx
        .move_file(MoveFileRequest {
            source: root.join("inside.txt"),
            destination: base.join("outside.txt"),
        })
        .expect_err("outside destination");
    assert!(err.is_access_denied());
    assert!(root.join("inside.txt").exists());

    match ctx.move_file(MoveFileRequest {
        source: root.clone(),
        destination: root.join("renamed"),
    }) {
        Err(Error::InvalidPath(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn search_is_case_insensitive_and_recursive() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("docs/Guide")).expect("mkdir");
    fs::write(root.join("README.md"), "").expect("write");
    fs::write(root.join("docs/readme.txt"), "").expect("write");
    fs::write(root.join("docs/Guide/other.md"), "").expect("write");
    let ctx = test_context(&root);

    let response = ctx
        .search_files(SearchFilesRequest {
            path: root.clone(),
            pattern: "ReadMe".to_string(),
            exclude_patterns: Vec::new(),
        })
        .expect("search");
    assert_eq!(
        response.matches,
        vec![root.join("README.md"), root.join("docs/readme.txt")]
    );
    assert!(!response.truncated);
}

#[test]
fn search_stops_at_max_results() {
    let (_dir, root) = canonical_tempdir();
    for name in ["hit1", "hit2", "hit3"] {
        fs::write(root.join(name), "").expect("write");
    }
    let mut policy = test_policy(&root);
    policy.limits.max_results = 2;
    let ctx = Context::new(policy).expect("ctx");

    let response = ctx
        .search_files(SearchFilesRequest {
            path: root.clone(),
            pattern: "hit".to_string(),
            exclude_patterns: Vec::new(),
        })
        .expect("search");
    assert_eq!(response.matches.len(), 2);
    assert!(response.truncated);
}

#[test]
fn file_info_describes_files_and_directories() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("f.txt"), "12345").expect("write");
    let ctx = test_context(&root);

    let file = ctx
        .get_file_info(FileInfoRequest {
            path: root.join("f.txt"),
        })
        .expect("stat file");
    assert_eq!(file.kind, EntryKind::File);
    assert_eq!(file.size_bytes, 5);
    assert!(file.permissions.starts_with('-'));
    assert_eq!(file.permissions.len(), 10);
    assert!(file.modified_ms.is_some());

    let dir = ctx
        .get_file_info(FileInfoRequest { path: root.clone() })
        .expect("stat dir");
    assert_eq!(dir.kind, EntryKind::Dir);
    assert!(dir.permissions.starts_with('d'));
}

#[test]
#[cfg(unix)]
fn file_info_reports_inside_symlink_without_following() {
    use std::os::unix::fs::symlink;

    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("target.txt"), "x").expect("write");
    symlink("target.txt", root.join("link")).expect("symlink");
    let ctx = test_context(&root);

    let info = ctx
        .get_file_info(FileInfoRequest {
            path: root.join("link"),
        })
        .expect("stat link");
    assert_eq!(info.kind, EntryKind::Symlink);
    assert_eq!(
        info.symlink_target.as_deref(),
        Some(std::path::Path::new("target.txt"))
    );
    assert!(info.permissions.starts_with('l'));
}

#[test]
fn allowed_directories_are_canonical_and_deduplicated() {
    let (_dir, base) = canonical_tempdir();
    let a = base.join("a");
    let b = base.join("b");
    fs::create_dir(&a).expect("mkdir");
    fs::create_dir(&b).expect("mkdir");

    let policy = SandboxPolicy::from_roots(
        [a.clone(), b.join("../b"), a.join(".")],
        Permissions::read_only(),
    );
    let ctx = Context::new(policy).expect("ctx");
    assert_eq!(ctx.list_allowed_directories().directories, vec![a, b]);
}

#[test]
fn read_only_policy_blocks_mutation() {
    let (_dir, root) = canonical_tempdir();
    let ctx = Context::new(SandboxPolicy::from_roots([&root], Permissions::read_only()))
        .expect("ctx");
    match ctx.write_file(WriteFileRequest {
        path: root.join("x"),
        content: String::new(),
    }) {
        Err(Error::NotPermitted(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!root.join("x").exists());
}
