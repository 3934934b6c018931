mod common;

use std::fs;
use std::path::PathBuf;

use common::{canonical_tempdir, test_context};
use rooted_fs::Error;
use rooted_fs::guard::AllowedRoots;
use rooted_fs::ops::{ReadFileRequest, WriteFileRequest, read_file, write_file};

fn assert_access_denied(err: Error) {
    assert!(
        err.to_string().starts_with("access denied"),
        "unexpected message: {err}"
    );
    assert!(err.is_access_denied(), "unexpected error: {err:?}");
}

#[test]
fn paths_inside_validate_and_outside_fail() {
    let (_dir, root) = canonical_tempdir();
    let allowed = root.join("allowed");
    fs::create_dir(&allowed).expect("mkdir");
    fs::write(allowed.join("in.txt"), "in").expect("write");
    fs::write(root.join("out.txt"), "out").expect("write");

    let roots = AllowedRoots::new([&allowed]).expect("roots");
    let resolved = roots.validate(&allowed.join("in.txt")).expect("inside");
    assert_eq!(resolved.as_path(), allowed.join("in.txt"));

    match roots.validate(&root.join("out.txt")) {
        Err(Error::OutsideAllowedRoots(path)) => assert_eq!(path, root.join("out.txt")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn dotdot_is_normalized_before_the_check() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir(root.join("sub")).expect("mkdir");
    fs::write(root.join("file.txt"), "x").expect("write");

    let roots = AllowedRoots::new([&root]).expect("roots");
    let resolved = roots
        .validate(&root.join("sub/../file.txt"))
        .expect("validate");
    assert_eq!(resolved.as_path(), root.join("file.txt"));
}

#[test]
fn tilde_expands_to_home() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    if home.canonicalize().ok().as_ref() != Some(&home) {
        return;
    }
    let roots = AllowedRoots::new([&home]).expect("roots");
    let resolved = roots
        .validate(&PathBuf::from("~/some-file-that-need-not-exist"))
        .expect("validate");
    assert_eq!(
        resolved.as_path(),
        home.join("some-file-that-need-not-exist")
    );
}

#[test]
#[cfg(unix)]
fn escaping_symlink_cannot_be_read_or_written_through() {
    use std::os::unix::fs::symlink;

    let (_dir, base) = canonical_tempdir();
    let root = base.join("root");
    let outside = base.join("outside");
    fs::create_dir(&root).expect("mkdir");
    fs::create_dir(&outside).expect("mkdir");
    fs::write(outside.join("secret.txt"), "secret").expect("write");
    symlink(outside.join("secret.txt"), root.join("file-link")).expect("symlink");
    symlink(&outside, root.join("dir-link")).expect("symlink");

    let ctx = test_context(&root);
    let err = read_file(
        &ctx,
        ReadFileRequest {
            path: root.join("file-link"),
        },
    )
    .expect_err("read through escaping link");
    assert_access_denied(err);

    let err = write_file(
        &ctx,
        WriteFileRequest {
            path: root.join("dir-link").join("planted.txt"),
            content: "x".to_string(),
        },
    )
    .expect_err("write through escaping dir link");
    assert_access_denied(err);
    assert!(!outside.join("planted.txt").exists());
    assert_eq!(
        fs::read_to_string(outside.join("secret.txt")).expect("read"),
        "secret"
    );
}

#[test]
#[cfg(unix)]
fn mutual_symlinks_are_a_loop() {
    use std::os::unix::fs::symlink;

    let (_dir, root) = canonical_tempdir();
    symlink(root.join("ping"), root.join("pong")).expect("symlink");
    symlink(root.join("pong"), root.join("ping")).expect("symlink");

    let roots = AllowedRoots::new([&root]).expect("roots");
    let err = roots.validate(&root.join("ping")).expect_err("loop");
    match &err {
        Error::SymlinkLoop(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_access_denied(err);
}

#[test]
#[cfg(unix)]
fn intermediate_symlinked_directory_is_checked() {
    use std::os::unix::fs::symlink;

    let (_dir, base) = canonical_tempdir();
    let root = base.join("root");
    fs::create_dir(&root).expect("mkdir");
    fs::create_dir_all(base.join("elsewhere/nested")).expect("mkdir");
    fs::write(base.join("elsewhere/nested/data.txt"), "data").expect("write");
    fs::create_dir(root.join("a")).expect("mkdir");
    symlink("../../elsewhere", root.join("a/hop")).expect("symlink");

    let roots = AllowedRoots::new([&root]).expect("roots");
    let err = roots
        .validate(&root.join("a/hop/nested/data.txt"))
        .expect_err("escape via intermediate dir");
    assert_access_denied(err);
}
