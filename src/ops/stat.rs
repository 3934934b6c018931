use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfoRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfoResponse {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size_bytes: u64,
    /// `ls -l` style, e.g. `-rw-r--r--`.
    pub permissions: String,
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ms: Option<u64>,
    /// Inode change time; unix only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<PathBuf>,
}

fn system_time_to_millis(value: SystemTime) -> Option<u64> {
    value
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
}

fn metadata_time_to_millis(value: std::io::Result<SystemTime>) -> Result<Option<u64>> {
    match value {
        Ok(time) => Ok(system_time_to_millis(time)),
        Err(err) if err.kind() == ErrorKind::Unsupported => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn changed_millis(meta: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;

    let secs = u64::try_from(meta.ctime()).ok()?;
    let nanos = u64::try_from(meta.ctime_nsec()).ok()?;
    secs.checked_mul(1000)?.checked_add(nanos / 1_000_000)
}

#[cfg(not(unix))]
fn changed_millis(_meta: &fs::Metadata) -> Option<u64> {
    None
}

#[cfg(unix)]
fn permission_string(kind: EntryKind, meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(10);
    out.push(match kind {
        EntryKind::Dir => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::File => '-',
        EntryKind::Other => '?',
    });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(kind: EntryKind, meta: &fs::Metadata) -> String {
    let type_char = match kind {
        EntryKind::Dir => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::File => '-',
        EntryKind::Other => '?',
    };
    if meta.permissions().readonly() {
        format!("{type_char}r--r--r--")
    } else {
        format!("{type_char}rw-rw-rw-")
    }
}

/// Metadata of the path itself; a symlink is described, not followed.
pub fn get_file_info(ctx: &Context, request: FileInfoRequest) -> Result<FileInfoResponse> {
    if !ctx.policy.permissions.stat {
        return Err(Error::NotPermitted(
            "stat is disabled by policy".to_string(),
        ));
    }

    let path = ctx.resolve("get_file_info", &request.path)?;
    let meta = fs::symlink_metadata(&path)?;
    let kind = EntryKind::from_file_type(meta.file_type());
    let symlink_target = match kind {
        EntryKind::Symlink => Some(fs::read_link(&path)?),
        _ => None,
    };

    Ok(FileInfoResponse {
        kind,
        size_bytes: meta.len(),
        permissions: permission_string(kind, &meta),
        readonly: meta.permissions().readonly(),
        modified_ms: metadata_time_to_millis(meta.modified())?,
        accessed_ms: metadata_time_to_millis(meta.accessed())?,
        created_ms: metadata_time_to_millis(meta.created())?,
        changed_ms: changed_millis(&meta),
        symlink_target,
        path: path.into_path_buf(),
    })
}
