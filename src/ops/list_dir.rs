use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDirectoryResponse {
    pub path: PathBuf,
    pub entries: Vec<ListDirEntry>,
    pub skipped_io_errors: u64,
}

pub fn list_directory(
    ctx: &Context,
    request: ListDirectoryRequest,
) -> Result<ListDirectoryResponse> {
    if !ctx.policy.permissions.list_dir {
        return Err(Error::NotPermitted(
            "list_dir is disabled by policy".to_string(),
        ));
    }

    let dir = ctx.resolve("list_directory", &request.path)?;
    let meta = fs::metadata(&dir)?;
    if !meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            dir.display()
        )));
    }

    let mut rows = fs::read_dir(&dir)?.collect::<std::io::Result<Vec<_>>>()?;
    rows.sort_by_key(|entry| entry.file_name());

    let mut entries = Vec::<ListDirEntry>::with_capacity(rows.len());
    let mut skipped_io_errors: u64 = 0;
    for entry in rows {
        let file_type = match entry.file_type() {
            Ok(value) => value,
            Err(err) => {
                tracing::trace!(path = %entry.path().display(), error = %err, "skipping entry");
                skipped_io_errors += 1;
                continue;
            }
        };
        entries.push(ListDirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: EntryKind::from_file_type(file_type),
        });
    }

    Ok(ListDirectoryResponse {
        path: dir.into_path_buf(),
        entries,
        skipped_io_errors,
    })
}
