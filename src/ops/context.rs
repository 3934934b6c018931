use std::path::Path;

use crate::error::Result;
use crate::exclude::ExcludeMatcher;
use crate::guard::{AllowedRoots, ResolvedPath};
use crate::policy::SandboxPolicy;

use super::{
    Context, CreateDirectoryRequest, CreateDirectoryResponse, DirectoryTreeRequest,
    DirectoryTreeResponse, EditFileRequest, EditFileResponse, FileInfoRequest, FileInfoResponse,
    ListAllowedDirectoriesResponse, ListDirectoryRequest, ListDirectoryResponse, MoveFileRequest,
    MoveFileResponse, ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest,
    ReadMultipleFilesResponse, SearchFilesRequest, SearchFilesResponse, WriteFileRequest,
    WriteFileResponse,
};

impl Context {
    pub fn new(policy: SandboxPolicy) -> Result<Self> {
        policy.validate()?;
        let roots = AllowedRoots::new(&policy.roots)?;
        let default_excludes = ExcludeMatcher::new(&policy.traversal.exclude_patterns)?;

        tracing::debug!(
            roots = ?roots.as_slice(),
            exclude_patterns = default_excludes.len(),
            "context ready"
        );

        Ok(Self {
            policy,
            roots,
            default_excludes,
        })
    }

    #[cfg(feature = "policy-io")]
    pub fn from_policy_path(path: impl AsRef<Path>) -> Result<Self> {
        let policy = crate::policy_io::load_policy(path)?;
        Self::new(policy)
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    pub fn read_file(&self, request: ReadFileRequest) -> Result<ReadFileResponse> {
        super::read_file(self, request)
    }

    pub fn read_multiple_files(
        &self,
        request: ReadMultipleFilesRequest,
    ) -> Result<ReadMultipleFilesResponse> {
        super::read_multiple_files(self, request)
    }

    pub fn write_file(&self, request: WriteFileRequest) -> Result<WriteFileResponse> {
        super::write_file(self, request)
    }

    pub fn edit_file(&self, request: EditFileRequest) -> Result<EditFileResponse> {
        super::edit_file(self, request)
    }

    pub fn create_directory(
        &self,
        request: CreateDirectoryRequest,
    ) -> Result<CreateDirectoryResponse> {
        super::create_directory(self, request)
    }

    pub fn list_directory(&self, request: ListDirectoryRequest) -> Result<ListDirectoryResponse> {
        super::list_directory(self, request)
    }

    pub fn directory_tree(&self, request: DirectoryTreeRequest) -> Result<DirectoryTreeResponse> {
        super::directory_tree(self, request)
    }

    pub fn move_file(&self, request: MoveFileRequest) -> Result<MoveFileResponse> {
        super::move_file(self, request)
    }

    pub fn search_files(&self, request: SearchFilesRequest) -> Result<SearchFilesResponse> {
        super::search_files(self, request)
    }

    pub fn get_file_info(&self, request: FileInfoRequest) -> Result<FileInfoResponse> {
        super::get_file_info(self, request)
    }

    pub fn list_allowed_directories(&self) -> ListAllowedDirectoriesResponse {
        super::list_allowed_directories(self)
    }

    pub(super) fn resolve(&self, op: &str, path: &Path) -> Result<ResolvedPath> {
        let resolved = self.roots.validate(path);
        if let Err(err) = &resolved {
            tracing::debug!(op, path = %path.display(), error = %err, "path rejected");
        }
        resolved
    }

    /// Policy-wide excludes followed by `extra`.
    pub(super) fn exclude_matcher(&self, extra: &[String]) -> Result<ExcludeMatcher> {
        let mut matcher = self.default_excludes.clone();
        for pattern in extra {
            matcher.add_pattern(pattern)?;
        }
        Ok(matcher)
    }
}
