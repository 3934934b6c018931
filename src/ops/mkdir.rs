use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryResponse {
    pub path: PathBuf,
    /// `false` when the directory already existed.
    pub created: bool,
}

/// Creates the directory and any missing parents. An existing directory is not an error.
pub fn create_directory(
    ctx: &Context,
    request: CreateDirectoryRequest,
) -> Result<CreateDirectoryResponse> {
    if !ctx.policy.permissions.mkdir {
        return Err(Error::NotPermitted(
            "mkdir is disabled by policy".to_string(),
        ));
    }

    let path = ctx.resolve("create_directory", &request.path)?;
    let created = match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => false,
        Ok(_) => {
            return Err(Error::InvalidPath(format!(
                "path {} exists and is not a directory",
                path.display()
            )));
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(&path)?;
            true
        }
        Err(err) => return Err(err.into()),
    };

    Ok(CreateDirectoryResponse {
        path: path.into_path_buf(),
        created,
    })
}
