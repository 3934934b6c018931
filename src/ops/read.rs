use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub path: PathBuf,
    pub content: String,
}

pub fn read_file(ctx: &Context, request: ReadFileRequest) -> Result<ReadFileResponse> {
    if !ctx.policy.permissions.read {
        return Err(Error::NotPermitted(
            "read is disabled by policy".to_string(),
        ));
    }

    let path = ctx.resolve("read_file", &request.path)?;
    let content = super::io::read_string_limited(&path, ctx.policy.limits.max_read_bytes)?;
    Ok(ReadFileResponse {
        path: path.into_path_buf(),
        content,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadMultipleFilesRequest {
    pub paths: Vec<PathBuf>,
}

/// Outcome for one requested path: either `content` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadManyEntry {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadMultipleFilesResponse {
    pub files: Vec<ReadManyEntry>,
}

pub fn read_multiple_files(
    ctx: &Context,
    request: ReadMultipleFilesRequest,
) -> Result<ReadMultipleFilesResponse> {
    if !ctx.policy.permissions.read {
        return Err(Error::NotPermitted(
            "read is disabled by policy".to_string(),
        ));
    }
    if request.paths.len() > ctx.policy.limits.max_read_many {
        return Err(Error::InvalidInput(format!(
            "too many paths: {} (max {})",
            request.paths.len(),
            ctx.policy.limits.max_read_many
        )));
    }

    let files = request
        .paths
        .into_iter()
        .map(|requested| {
            let outcome = ctx
                .resolve("read_multiple_files", &requested)
                .and_then(|path| {
                    super::io::read_string_limited(&path, ctx.policy.limits.max_read_bytes)
                });
            match outcome {
                Ok(content) => ReadManyEntry {
                    path: requested,
                    content: Some(content),
                    error: None,
                    error_code: None,
                },
                Err(err) => ReadManyEntry {
                    path: requested,
                    content: None,
                    error: Some(err.to_string()),
                    error_code: Some(err.code().to_string()),
                },
            }
        })
        .collect();

    Ok(ReadMultipleFilesResponse { files })
}
