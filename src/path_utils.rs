//! Lexical path helpers shared by the guard, the exclude matcher and the ops.
//!
//! Nothing here touches the filesystem. `normalize_path_lexical`:
//! - drops `.` segments;
//! - resolves `..` against a preceding normal segment;
//! - keeps leading `..` on relative paths (`../../a/../b` → `../../b`);
//! - clamps `..` at the root of absolute paths (`/../etc` → `/etc`).
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;

use crate::error::{Error, Result};

pub(crate) fn normalize_path_lexical(path: &Path) -> PathBuf {
    enum Segment {
        ParentDir,
        Normal(OsString),
    }

    let mut path_prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut segments: Vec<Segment> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(segments.last(), Some(Segment::Normal(_))) {
                    segments.pop();
                } else if !has_root {
                    segments.push(Segment::ParentDir);
                }
            }
            Component::Normal(part) => segments.push(Segment::Normal(part.to_os_string())),
            Component::RootDir => has_root = true,
            Component::Prefix(prefix) => {
                path_prefix = Some(prefix.as_os_str().to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(prefix) = path_prefix {
        out.push(Path::new(&prefix));
    }
    if has_root {
        if out.as_os_str().is_empty() {
            out.push(std::path::MAIN_SEPARATOR_STR);
        } else {
            // Pushing RootDir after a Windows prefix would drop the prefix.
            out.as_mut_os_string().push(std::path::MAIN_SEPARATOR_STR);
        }
    }
    for segment in segments {
        match segment {
            Segment::ParentDir => out.push(".."),
            Segment::Normal(part) => out.push(part),
        }
    }

    if out.as_os_str().is_empty() && path.is_relative() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Component-wise containment: `/srv/app` contains `/srv/app/x` but not `/srv/app2`.
///
/// Both inputs are normalized lexically first.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize_path_lexical(path).starts_with(normalize_path_lexical(root))
}

/// Replaces a leading `~` (alone or followed by a separator) with the home directory.
///
/// `~user` forms are left untouched.
pub(crate) fn expand_home(path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or_else(|| {
                Error::InvalidPath("cannot expand '~': home directory is unknown".to_string())
            })?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}

/// `path` relative to `root`, rendered with `/` separators.
///
/// Returns `None` when `path` is not under `root`. The root itself renders as `""`.
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut out = String::new();
    for comp in rel.components() {
        if let Component::Normal(part) = comp {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    Some(out)
}

pub(crate) fn build_glob(pattern: &str) -> std::result::Result<globset::Glob, globset::Error> {
    let mut builder = GlobBuilder::new(pattern);
    builder.literal_separator(true);
    #[cfg(windows)]
    builder.case_insensitive(true);
    builder.build()
}
