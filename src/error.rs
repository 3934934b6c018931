use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Filesystem errors are passed through untranslated.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("access denied - path outside allowed directories: {}", .0.display())]
    OutsideAllowedRoots(PathBuf),

    #[error("access denied - symlink loop detected: {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("could not find exact match for edit:\n{old_text}")]
    EditNotFound { old_text: String },

    #[error("operation is not permitted: {0}")]
    NotPermitted(String),

    #[error("file is too large ({size_bytes} bytes; max {max_bytes} bytes): {}", .path.display())]
    FileTooLarge {
        path: PathBuf,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("invalid utf-8 in file: {}", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("invalid exclude pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub const CODE_IO: &'static str = "io";
    pub const CODE_WALKDIR: &'static str = "walkdir";
    pub const CODE_JSON: &'static str = "json";
    pub const CODE_INVALID_POLICY: &'static str = "invalid_policy";
    pub const CODE_INVALID_PATH: &'static str = "invalid_path";
    pub const CODE_OUTSIDE_ALLOWED_ROOTS: &'static str = "outside_allowed_roots";
    pub const CODE_SYMLINK_LOOP: &'static str = "symlink_loop";
    pub const CODE_EDIT_NOT_FOUND: &'static str = "edit_not_found";
    pub const CODE_NOT_PERMITTED: &'static str = "not_permitted";
    pub const CODE_FILE_TOO_LARGE: &'static str = "file_too_large";
    pub const CODE_INVALID_UTF8: &'static str = "invalid_utf8";
    pub const CODE_INVALID_PATTERN: &'static str = "invalid_pattern";
    pub const CODE_INVALID_INPUT: &'static str = "invalid_input";

    /// Stable machine-readable code for each variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => Self::CODE_IO,
            Error::WalkDir(_) => Self::CODE_WALKDIR,
            Error::Json(_) => Self::CODE_JSON,
            Error::InvalidPolicy(_) => Self::CODE_INVALID_POLICY,
            Error::InvalidPath(_) => Self::CODE_INVALID_PATH,
            Error::OutsideAllowedRoots(_) => Self::CODE_OUTSIDE_ALLOWED_ROOTS,
            Error::SymlinkLoop(_) => Self::CODE_SYMLINK_LOOP,
            Error::EditNotFound { .. } => Self::CODE_EDIT_NOT_FOUND,
            Error::NotPermitted(_) => Self::CODE_NOT_PERMITTED,
            Error::FileTooLarge { .. } => Self::CODE_FILE_TOO_LARGE,
            Error::InvalidUtf8(_) => Self::CODE_INVALID_UTF8,
            Error::InvalidPattern(_) => Self::CODE_INVALID_PATTERN,
            Error::InvalidInput(_) => Self::CODE_INVALID_INPUT,
        }
    }

    /// True for failures that mean "this path is not reachable under the allowed roots".
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Error::OutsideAllowedRoots(_) | Error::SymlinkLoop(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
