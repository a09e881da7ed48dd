use std::path::PathBuf;

pub const DEFAULT_IMAGE: &str = "ghcr.io/clankerbot/clankercage:latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Run a prebuilt image.
    Image(String),
    /// Build from `<context>/Dockerfile`.
    Build { context: PathBuf },
}

impl Default for ImageSource {
    fn default() -> Self {
        Self::Image(DEFAULT_IMAGE.to_string())
    }
}

/// Per-launch settings folded into the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    pub image: ImageSource,
    /// Host directory bind-mounted at `/workspace`.
    pub project_dir: PathBuf,
    pub ssh_key: Option<PathBuf>,
    pub gpg_key_id: Option<String>,
    pub git_user_name: Option<String>,
    pub git_user_email: Option<String>,
    pub gh_token: Option<String>,
}

impl ConfigOptions {
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }
}
