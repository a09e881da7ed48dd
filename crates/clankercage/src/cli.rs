//! Command-line surface. Every setting is read once into a [`LaunchRequest`].

use std::path::PathBuf;

use clap::Parser;
use devcontainer_config::{ConfigOptions, ImageSource};

use crate::assistant::AssistantCommand;

pub const SSH_KEY_ENV: &str = "CLANKERCAGE_SSH_KEY";
pub const GIT_USER_NAME_ENV: &str = "CLANKERCAGE_GIT_USER_NAME";
pub const GIT_USER_EMAIL_ENV: &str = "CLANKERCAGE_GIT_USER_EMAIL";
pub const GH_TOKEN_ENV: &str = "CLANKERCAGE_GH_TOKEN";
pub const GPG_KEY_ID_ENV: &str = "CLANKERCAGE_GPG_KEY_ID";

#[derive(Debug, Parser)]
#[command(name = "clankercage")]
#[command(about = "Run Claude Code in a sandboxed devcontainer", long_about = None)]
#[command(after_help = "Any additional arguments are passed to claude.")]
pub struct Args {
    /// Path to an SSH private key mounted read-only for GitHub access
    #[arg(long, env = SSH_KEY_ENV, value_name = "PATH")]
    pub ssh_key_file: Option<PathBuf>,

    /// Git user.name inside the container
    #[arg(long, env = GIT_USER_NAME_ENV)]
    pub git_user_name: Option<String>,

    /// Git user.email inside the container
    #[arg(long, env = GIT_USER_EMAIL_ENV)]
    pub git_user_email: Option<String>,

    /// GitHub token used for `gh auth login`
    #[arg(long, env = GH_TOKEN_ENV, hide_env_values = true)]
    pub gh_token: Option<String>,

    /// GPG key id for signed commits; mounts ~/.gnupg read-only
    #[arg(long, env = GPG_KEY_ID_ENV)]
    pub gpg_key_id: Option<String>,

    /// Build the image from CONTEXT_DIR/Dockerfile instead of pulling it
    #[arg(long, value_name = "CONTEXT_DIR", conflicts_with = "image")]
    pub build: Option<PathBuf>,

    /// Prebuilt image to run
    #[arg(long, value_name = "NAME")]
    pub image: Option<String>,

    /// Run a shell command instead of claude (for testing)
    #[arg(long, value_name = "CMD")]
    pub shell: Option<String>,

    /// Keep claude's permission prompts enabled
    #[arg(long)]
    pub safe_mode: bool,

    /// Leave the container and instance workspace in place on exit
    #[arg(long)]
    pub keep_container: bool,

    /// Write logs here instead of the per-instance log file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Arguments passed through to claude
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CLAUDE_ARGS")]
    pub assistant_args: Vec<String>,
}

/// Everything one launch needs, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub project_dir: PathBuf,
    pub config: ConfigOptions,
    pub assistant: AssistantCommand,
    pub keep_container: bool,
    pub log_file: Option<PathBuf>,
}

impl Args {
    #[must_use]
    pub fn into_request(self, project_dir: PathBuf) -> LaunchRequest {
        let image = match (self.build, self.image) {
            (Some(context), _) => ImageSource::Build { context },
            (None, Some(image)) => ImageSource::Image(image),
            (None, None) => ImageSource::default(),
        };

        let config = ConfigOptions {
            image,
            project_dir: project_dir.clone(),
            ssh_key: self.ssh_key_file,
            gpg_key_id: non_empty(self.gpg_key_id),
            git_user_name: non_empty(self.git_user_name),
            git_user_email: non_empty(self.git_user_email),
            gh_token: non_empty(self.gh_token),
        };

        LaunchRequest {
            project_dir,
            config,
            assistant: AssistantCommand::from_flags(
                self.shell,
                self.safe_mode,
                self.assistant_args,
            ),
            keep_container: self.keep_container,
            log_file: self.log_file,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
