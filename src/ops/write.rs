use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileResponse {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// `false` when an existing file was replaced.
    pub created: bool,
}

pub fn write_file(ctx: &Context, request: WriteFileRequest) -> Result<WriteFileResponse> {
    if !ctx.policy.permissions.write {
        return Err(Error::NotPermitted(
            "write is disabled by policy".to_string(),
        ));
    }

    let path = ctx.resolve("write_file", &request.path)?;
    super::io::ensure_write_size(
        &path,
        request.content.len(),
        ctx.policy.limits.max_write_bytes,
    )?;

    let created = match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => {
            return Err(Error::InvalidPath(format!(
                "path {} is a directory",
                path.display()
            )));
        }
        Ok(_) => false,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => return Err(err.into()),
    };

    super::io::write_bytes_atomic(&path, request.content.as_bytes())?;
    tracing::debug!(path = %path.display(), created, "file written");

    Ok(WriteFileResponse {
        path: path.into_path_buf(),
        bytes_written: u64::try_from(request.content.len()).unwrap_or(u64::MAX),
        created,
    })
}
