use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryTreeRequest {
    pub path: PathBuf,
    /// Directory levels to expand below the immediate children; `1` lists the children and
    /// their children. Defaults to `limits.max_tree_depth` and is clamped to it.
    #[serde(default, alias = "maxDepth")]
    pub max_depth: Option<usize>,
    #[serde(default, alias = "excludePatterns")]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryType,
    /// Present, possibly empty, for directories that were listed. Absent for files and for
    /// directories left unlisted by the depth cut, walk truncation, or a read error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryTreeResponse {
    pub path: PathBuf,
    pub entries: Vec<TreeEntry>,
    /// Set when `limits.max_walk_entries` cut the walk short.
    pub truncated: bool,
    pub skipped_io_errors: u64,
}

struct Node {
    name: String,
    is_dir: bool,
    listed: bool,
    children: Vec<usize>,
}

struct Pending {
    dir: PathBuf,
    node: Option<usize>,
    depth: usize,
}

/// Builds the tree with an explicit stack into a flat arena, then assembles nested entries
/// bottom-up. Symlinks are listed as files and never descended into.
pub fn directory_tree(ctx: &Context, request: DirectoryTreeRequest) -> Result<DirectoryTreeResponse> {
    if !ctx.policy.permissions.tree {
        return Err(Error::NotPermitted(
            "tree is disabled by policy".to_string(),
        ));
    }
    let max_depth = match request.max_depth {
        Some(0) => {
            return Err(Error::InvalidInput(
                "max_depth must be a positive integer".to_string(),
            ));
        }
        Some(depth) => depth.min(ctx.policy.limits.max_tree_depth),
        None => ctx.policy.limits.max_tree_depth,
    };

    let root = ctx.resolve("directory_tree", &request.path)?;
    if !fs::metadata(&root)?.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            root.display()
        )));
    }
    let excludes = ctx.exclude_matcher(&request.exclude_patterns)?;

    let mut nodes: Vec<Node> = Vec::new();
    let mut top_level: Vec<usize> = Vec::new();
    let mut truncated = false;
    let mut skipped_io_errors: u64 = 0;
    let mut stack = vec![Pending {
        dir: root.to_path_buf(),
        node: None,
        depth: 0,
    }];

    'walk: while let Some(pending) = stack.pop() {
        let read = fs::read_dir(&pending.dir).and_then(|rows| rows.collect::<std::io::Result<Vec<_>>>());
        let mut rows = match read {
            Ok(rows) => rows,
            Err(err) if pending.node.is_none() => return Err(err.into()),
            Err(err) => {
                tracing::trace!(dir = %pending.dir.display(), error = %err, "skipping unreadable directory");
                skipped_io_errors += 1;
                continue;
            }
        };
        rows.sort_by_key(|entry| entry.file_name());
        if let Some(idx) = pending.node {
            nodes[idx].listed = true;
        }

        let mut descend = Vec::new();
        for entry in rows {
            let is_dir = match entry.file_type() {
                Ok(file_type) => file_type.is_dir(),
                Err(_) => {
                    skipped_io_errors += 1;
                    continue;
                }
            };
            let path = entry.path();
            if excludes.is_excluded(&root, &path, is_dir) {
                continue;
            }
            if nodes.len() >= ctx.policy.limits.max_walk_entries {
                truncated = true;
                tracing::debug!(root = %root.display(), "tree walk truncated");
                break 'walk;
            }

            let idx = nodes.len();
            nodes.push(Node {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
                listed: false,
                children: Vec::new(),
            });
            match pending.node {
                Some(parent) => nodes[parent].children.push(idx),
                None => top_level.push(idx),
            }
            if is_dir && pending.depth < max_depth {
                descend.push(Pending {
                    dir: path,
                    node: Some(idx),
                    depth: pending.depth + 1,
                });
            }
        }
        // Reverse so the first child is popped first; keeps arena indices in name order.
        stack.extend(descend.into_iter().rev());
    }

    Ok(DirectoryTreeResponse {
        path: root.into_path_buf(),
        entries: assemble(nodes, &top_level),
        truncated,
        skipped_io_errors,
    })
}

/// Children always have larger arena indices than their parent, so a single reverse pass
/// finishes every subtree before its parent needs it.
fn assemble(nodes: Vec<Node>, top_level: &[usize]) -> Vec<TreeEntry> {
    let mut built: Vec<Option<TreeEntry>> = (0..nodes.len()).map(|_| None).collect();
    for (idx, node) in nodes.into_iter().enumerate().rev() {
        let children = (node.is_dir && node.listed).then(|| {
            node.children
                .iter()
                .filter_map(|child| built[*child].take())
                .collect()
        });
        built[idx] = Some(TreeEntry {
            name: node.name,
            kind: if node.is_dir {
                TreeEntryType::Directory
            } else {
                TreeEntryType::File
            },
            children,
        });
    }
    top_level
        .iter()
        .filter_map(|idx| built[*idx].take())
        .collect()
}
