use serde::{Deserialize, Serialize};

/// Contents of `instance.json`, written once when the workspace is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceMetadata {
    pub id: String,
    pub label: String,
    pub created_at: String,
    pub project_dir: String,
    pub pid: u32,
}
