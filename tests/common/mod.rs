#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rooted_fs::ops::Context;
use rooted_fs::policy::{Permissions, SandboxPolicy};

pub fn test_policy(root: &Path) -> SandboxPolicy {
    SandboxPolicy::from_roots([root], Permissions::all())
}

pub fn test_context(root: &Path) -> Context {
    Context::new(test_policy(root)).expect("ctx")
}

/// A tempdir plus its canonical path, so assertions compare against what the guard returns.
pub fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().canonicalize().expect("canonicalize");
    (dir, root)
}
