use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilesRequest {
    pub path: PathBuf,
    /// Case-insensitive substring of the entry name.
    pub pattern: String,
    #[serde(default, alias = "excludePatterns")]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilesResponse {
    pub path: PathBuf,
    pub matches: Vec<PathBuf>,
    pub truncated: bool,
    pub scanned_entries: usize,
    pub skipped_walk_errors: u64,
}

pub fn search_files(ctx: &Context, request: SearchFilesRequest) -> Result<SearchFilesResponse> {
    if !ctx.policy.permissions.search {
        return Err(Error::NotPermitted(
            "search is disabled by policy".to_string(),
        ));
    }

    let root = ctx.resolve("search_files", &request.path)?;
    if !fs::metadata(&root)?.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            root.display()
        )));
    }
    let excludes = ctx.exclude_matcher(&request.exclude_patterns)?;
    let needle = request.pattern.to_lowercase();
    let limits = &ctx.policy.limits;

    let mut matches = Vec::<PathBuf>::new();
    let mut truncated = false;
    let mut scanned_entries: usize = 0;
    let mut skipped_walk_errors: u64 = 0;

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !excludes.is_excluded(&root, entry.path(), entry.file_type().is_dir()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                tracing::trace!(error = %err, "skipping walk error");
                skipped_walk_errors += 1;
                continue;
            }
        };
        if scanned_entries >= limits.max_walk_entries {
            truncated = true;
            break;
        }
        scanned_entries += 1;

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.contains(&needle) {
            continue;
        }
        if matches.len() >= limits.max_results {
            truncated = true;
            break;
        }
        matches.push(entry.into_path());
    }

    if truncated {
        tracing::debug!(
            root = %root.display(),
            scanned_entries,
            matches = matches.len(),
            "search truncated"
        );
    }

    Ok(SearchFilesResponse {
        path: root.into_path_buf(),
        matches,
        truncated,
        scanned_entries,
        skipped_walk_errors,
    })
}
