use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text_edit::{Edit, EditLimits, apply_file_edits_limited};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFileRequest {
    pub path: PathBuf,
    pub edits: Vec<Edit>,
    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFileResponse {
    pub path: PathBuf,
    /// Fenced unified diff of the change.
    pub diff: String,
    pub dry_run: bool,
}

pub fn edit_file(ctx: &Context, request: EditFileRequest) -> Result<EditFileResponse> {
    if !ctx.policy.permissions.edit {
        return Err(Error::NotPermitted(
            "edit is disabled by policy".to_string(),
        ));
    }

    let path = ctx.resolve("edit_file", &request.path)?;
    let display_path = request.path.to_string_lossy();
    let limits = EditLimits {
        max_read_bytes: ctx.policy.limits.max_read_bytes,
        max_write_bytes: ctx.policy.limits.max_write_bytes,
    };

    let diff = apply_file_edits_limited(
        &path,
        &display_path,
        &request.edits,
        request.dry_run,
        limits,
    )?;
    tracing::debug!(
        path = %path.display(),
        edits = request.edits.len(),
        dry_run = request.dry_run,
        "edits applied"
    );

    Ok(EditFileResponse {
        path: path.into_path_buf(),
        diff,
        dry_run: request.dry_run,
    })
}
