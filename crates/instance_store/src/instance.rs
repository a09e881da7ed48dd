use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::InstanceError;
use crate::id::{instance_label, InstanceId};
use crate::paths::{devcontainer_dir, metadata_path, workspace_dir};
use crate::schema::InstanceMetadata;

/// One launch: a fresh identifier plus a workspace directory nobody else uses.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    label: String,
    workspace_dir: PathBuf,
    devcontainer_dir: PathBuf,
}

impl Instance {
    /// Generates an id and claims `<root>/workspace-<id>` for it.
    pub fn create(root: &Path, project_dir: &Path) -> Result<Self, InstanceError> {
        Self::create_with_id(root, InstanceId::generate(), project_dir)
    }

    /// Claims `<root>/workspace-<id>` for an id generated earlier.
    ///
    /// The workspace directory is created exclusively; an existing directory is
    /// [`InstanceError::AlreadyExists`], never shared.
    pub fn create_with_id(
        root: &Path,
        id: InstanceId,
        project_dir: &Path,
    ) -> Result<Self, InstanceError> {
        let label = instance_label(&id);

        fs::create_dir_all(root)
            .map_err(|source| InstanceError::io("creating cache root", root, source))?;

        let workspace_dir = workspace_dir(root, &id);
        fs::create_dir(&workspace_dir).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                InstanceError::AlreadyExists {
                    path: workspace_dir.clone(),
                }
            } else {
                InstanceError::io("creating instance workspace", &workspace_dir, source)
            }
        })?;

        let instance = Self {
            devcontainer_dir: devcontainer_dir(&workspace_dir),
            id,
            label,
            workspace_dir,
        };
        if let Err(err) = instance.populate(project_dir) {
            let _ = fs::remove_dir_all(&instance.workspace_dir);
            return Err(err);
        }

        tracing::debug!(
            id = %instance.id,
            workspace = %instance.workspace_dir.display(),
            "created instance"
        );
        Ok(instance)
    }

    fn populate(&self, project_dir: &Path) -> Result<(), InstanceError> {
        fs::create_dir(&self.devcontainer_dir).map_err(|source| {
            InstanceError::io("creating devcontainer directory", &self.devcontainer_dir, source)
        })?;

        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(InstanceError::ClockFormat)?;
        let metadata = InstanceMetadata {
            id: self.id.to_string(),
            label: self.label.clone(),
            created_at,
            project_dir: project_dir.display().to_string(),
            pid: std::process::id(),
        };

        let path = metadata_path(&self.workspace_dir);
        let json = serde_json::to_vec_pretty(&metadata)
            .map_err(|source| InstanceError::json(&path, source))?;
        fs::write(&path, json)
            .map_err(|source| InstanceError::io("writing instance metadata", &path, source))
    }

    #[must_use]
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// `clankercage.instance=<id>`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    #[must_use]
    pub fn devcontainer_dir(&self) -> &Path {
        &self.devcontainer_dir
    }

    /// Deletes the workspace directory and everything in it.
    pub fn remove(self) -> Result<(), InstanceError> {
        fs::remove_dir_all(&self.workspace_dir).map_err(|source| {
            InstanceError::io("removing instance workspace", &self.workspace_dir, source)
        })?;
        tracing::debug!(id = %self.id, "removed instance workspace");
        Ok(())
    }
}

/// Reads `instance.json` from an instance workspace.
pub fn read_metadata(workspace: &Path) -> Result<InstanceMetadata, InstanceError> {
    let path = metadata_path(workspace);
    let bytes = fs::read(&path)
        .map_err(|source| InstanceError::io("reading instance metadata", &path, source))?;
    serde_json::from_slice(&bytes).map_err(|source| InstanceError::json(&path, source))
}
