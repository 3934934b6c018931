use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which operations a caller may invoke. Everything defaults to disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Permissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub mkdir: bool,
    #[serde(default)]
    pub list_dir: bool,
    #[serde(default)]
    pub tree: bool,
    #[serde(default, rename = "move")]
    pub move_path: bool,
    #[serde(default)]
    pub search: bool,
    #[serde(default)]
    pub stat: bool,
}

impl Permissions {
    pub const fn all() -> Self {
        Self {
            read: true,
            write: true,
            edit: true,
            mkdir: true,
            list_dir: true,
            tree: true,
            move_path: true,
            search: true,
            stat: true,
        }
    }

    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            edit: false,
            mkdir: false,
            list_dir: true,
            tree: true,
            move_path: false,
            search: true,
            stat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
    #[serde(default = "default_max_write_bytes")]
    pub max_write_bytes: u64,
    /// Cap on entries returned by `search_files`.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Cap on entries visited by one walk (`search_files`, `directory_tree`).
    #[serde(default = "default_max_walk_entries")]
    pub max_walk_entries: usize,
    /// Depth used by `directory_tree` when the request does not set one.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Cap on paths in one `read_multiple_files` request.
    #[serde(default = "default_max_read_many")]
    pub max_read_many: usize,
}

const fn default_max_read_bytes() -> u64 {
    1024 * 1024
}

const fn default_max_write_bytes() -> u64 {
    1024 * 1024
}

const fn default_max_results() -> usize {
    2000
}

const fn default_max_walk_entries() -> usize {
    500_000
}

const fn default_max_tree_depth() -> usize {
    100
}

const fn default_max_read_many() -> usize {
    64
}

const MAX_READ_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;
const MAX_WRITE_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;
const MAX_RESULTS_HARD_CAP: usize = 1_000_000;
const MAX_WALK_ENTRIES_HARD_CAP: usize = 10_000_000;
const MAX_TREE_DEPTH_HARD_CAP: usize = 4096;
const MAX_READ_MANY_HARD_CAP: usize = 4096;

fn validate_u64_limit(value: u64, field: &str, hard_cap: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidPolicy(format!("{field} must be > 0")));
    }
    if value > hard_cap {
        return Err(Error::InvalidPolicy(format!(
            "{field} must be <= {hard_cap}"
        )));
    }
    Ok(())
}

fn validate_usize_limit(value: usize, field: &str, hard_cap: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidPolicy(format!("{field} must be > 0")));
    }
    if value > hard_cap {
        return Err(Error::InvalidPolicy(format!(
            "{field} must be <= {hard_cap}"
        )));
    }
    Ok(())
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_read_bytes: default_max_read_bytes(),
            max_write_bytes: default_max_write_bytes(),
            max_results: default_max_results(),
            max_walk_entries: default_max_walk_entries(),
            max_tree_depth: default_max_tree_depth(),
            max_read_many: default_max_read_many(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TraversalRules {
    /// Gitignore-style patterns skipped by every walk, on top of per-request patterns.
    ///
    /// These only prune walks; direct access to a matching path is still allowed.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxPolicy {
    pub roots: Vec<PathBuf>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub traversal: TraversalRules,
}

impl SandboxPolicy {
    /// A policy over `roots` with the given permissions and default limits.
    pub fn from_roots<I, P>(roots: I, permissions: Permissions) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            permissions,
            limits: Limits::default(),
            traversal: TraversalRules::default(),
        }
    }

    /// Structural validation only.
    ///
    /// Root existence and directory checks happen in `ops::Context::new`, which also
    /// canonicalizes roots and compiles the exclude patterns.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::InvalidPolicy("roots is empty".to_string()));
        }
        for root in &self.roots {
            if root.as_os_str().is_empty() {
                return Err(Error::InvalidPolicy("root path is empty".to_string()));
            }
            if !root.is_absolute() {
                return Err(Error::InvalidPolicy(format!(
                    "root path must be absolute: {}",
                    root.display()
                )));
            }
        }
        validate_u64_limit(
            self.limits.max_read_bytes,
            "limits.max_read_bytes",
            MAX_READ_BYTES_HARD_CAP,
        )?;
        validate_u64_limit(
            self.limits.max_write_bytes,
            "limits.max_write_bytes",
            MAX_WRITE_BYTES_HARD_CAP,
        )?;
        validate_usize_limit(
            self.limits.max_results,
            "limits.max_results",
            MAX_RESULTS_HARD_CAP,
        )?;
        validate_usize_limit(
            self.limits.max_walk_entries,
            "limits.max_walk_entries",
            MAX_WALK_ENTRIES_HARD_CAP,
        )?;
        validate_usize_limit(
            self.limits.max_tree_depth,
            "limits.max_tree_depth",
            MAX_TREE_DEPTH_HARD_CAP,
        )?;
        validate_usize_limit(
            self.limits.max_read_many,
            "limits.max_read_many",
            MAX_READ_MANY_HARD_CAP,
        )?;
        Ok(())
    }
}
