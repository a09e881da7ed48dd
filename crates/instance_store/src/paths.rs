use std::path::{Path, PathBuf};

use crate::error::InstanceError;
use crate::id::InstanceId;

pub const APP_DIR: &str = "clankercage";
pub const DEVCONTAINER_DIR: &str = ".devcontainer";
pub const METADATA_FILE: &str = "instance.json";

/// `<user cache dir>/clankercage`.
pub fn cache_root() -> Result<PathBuf, InstanceError> {
    dirs::cache_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(InstanceError::NoCacheDir)
}

#[must_use]
pub fn workspace_dir(root: &Path, id: &InstanceId) -> PathBuf {
    root.join(format!("workspace-{id}"))
}

#[must_use]
pub fn devcontainer_dir(workspace: &Path) -> PathBuf {
    workspace.join(DEVCONTAINER_DIR)
}

#[must_use]
pub fn metadata_path(workspace: &Path) -> PathBuf {
    workspace.join(METADATA_FILE)
}
