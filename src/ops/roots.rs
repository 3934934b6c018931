use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAllowedDirectoriesResponse {
    pub directories: Vec<PathBuf>,
}

/// The canonical allowed roots, in configuration order. Needs no permission.
pub fn list_allowed_directories(ctx: &Context) -> ListAllowedDirectoriesResponse {
    ListAllowedDirectoriesResponse {
        directories: ctx.roots.as_slice().to_vec(),
    }
}
