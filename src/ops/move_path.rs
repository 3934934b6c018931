use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileResponse {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Renames `source` to `destination`. Both must be inside the allowed roots and the
/// destination must not exist yet.
pub fn move_file(ctx: &Context, request: MoveFileRequest) -> Result<MoveFileResponse> {
    if !ctx.policy.permissions.move_path {
        return Err(Error::NotPermitted(
            "move is disabled by policy".to_string(),
        ));
    }

    let source = ctx.resolve("move_file", &request.source)?;
    let destination = ctx.resolve("move_file", &request.destination)?;

    if ctx
        .roots
        .as_slice()
        .iter()
        .any(|root| root.as_path() == source.as_path())
    {
        return Err(Error::InvalidPath(
            "refusing to move an allowed root".to_string(),
        ));
    }

    let meta = fs::symlink_metadata(&source)?;
    match fs::symlink_metadata(&destination) {
        Ok(_) => {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("destination already exists: {}", destination.display()),
            )));
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    fs::rename(&source, &destination)?;
    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        "moved"
    );

    Ok(MoveFileResponse {
        source: source.into_path_buf(),
        destination: destination.into_path_buf(),
        kind: EntryKind::from_file_type(meta.file_type()),
    })
}
