use std::fs::FileType;

use serde::{Deserialize, Serialize};

use crate::exclude::ExcludeMatcher;
use crate::guard::AllowedRoots;
use crate::policy::SandboxPolicy;

mod context;
mod edit;
pub(crate) mod io;
mod list_dir;
mod mkdir;
mod move_path;
mod read;
mod roots;
mod search;
mod stat;
mod tree;
mod write;

pub use edit::{EditFileRequest, EditFileResponse, edit_file};
pub use list_dir::{ListDirEntry, ListDirectoryRequest, ListDirectoryResponse, list_directory};
pub use mkdir::{CreateDirectoryRequest, CreateDirectoryResponse, create_directory};
pub use move_path::{MoveFileRequest, MoveFileResponse, move_file};
pub use read::{
    ReadFileRequest, ReadFileResponse, ReadManyEntry, ReadMultipleFilesRequest,
    ReadMultipleFilesResponse, read_file, read_multiple_files,
};
pub use roots::{ListAllowedDirectoriesResponse, list_allowed_directories};
pub use search::{SearchFilesRequest, SearchFilesResponse, search_files};
pub use stat::{FileInfoRequest, FileInfoResponse, get_file_info};
pub use tree::{DirectoryTreeRequest, DirectoryTreeResponse, TreeEntry, TreeEntryType, directory_tree};
pub use write::{WriteFileRequest, WriteFileResponse, write_file};


/// Policy plus everything derived from it once: canonical roots and the compiled
/// policy-wide exclude patterns.
pub struct Context {
    policy: SandboxPolicy,
    roots: AllowedRoots,
    default_excludes: ExcludeMatcher,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("roots", &self.roots.as_slice())
            .field("permissions", &self.policy.permissions)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl EntryKind {
    pub(crate) fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}
