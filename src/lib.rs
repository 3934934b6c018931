//! `rooted-fs` confines file operations to a fixed set of allowed root directories.
//!
//! Every caller path goes through [`guard::AllowedRoots::validate`], which follows symlinks hop
//! by hop and refuses anything that leaves the roots. On top of that sit a fuzzy multi-edit
//! patcher ([`text_edit`]), gitignore-style walk filters ([`exclude`]) and typed request/response
//! operations ([`ops`]).

mod error;
pub mod exclude;
pub mod guard;
pub mod ops;
mod path_utils;
pub mod policy;
#[cfg(feature = "policy-io")]
pub mod policy_io;
pub mod text_edit;

pub use error::{Error, Result};

pub use exclude::{ExcludeMatcher, ExcludePattern};
pub use guard::{AllowedRoots, MAX_SYMLINK_HOPS, ResolvedPath};
pub use ops::{
    Context, CreateDirectoryRequest, CreateDirectoryResponse, DirectoryTreeRequest,
    DirectoryTreeResponse, EditFileRequest, EditFileResponse, EntryKind, FileInfoRequest,
    FileInfoResponse, ListAllowedDirectoriesResponse, ListDirEntry, ListDirectoryRequest,
    ListDirectoryResponse, MoveFileRequest, MoveFileResponse, ReadFileRequest, ReadFileResponse,
    ReadManyEntry, ReadMultipleFilesRequest, ReadMultipleFilesResponse, SearchFilesRequest,
    SearchFilesResponse, TreeEntry, TreeEntryType, WriteFileRequest, WriteFileResponse,
    create_directory, directory_tree, edit_file, get_file_info, list_allowed_directories,
    list_directory, move_file, read_file, read_multiple_files, search_files, write_file,
};
pub use path_utils::is_within;
pub use policy::{Limits, Permissions, SandboxPolicy, TraversalRules};
pub use text_edit::{Edit, apply_file_edits};
