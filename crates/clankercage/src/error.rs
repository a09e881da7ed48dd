use std::io;

use cage_pty::RelayError;
use devcontainer_config::ConfigError;
use instance_store::InstanceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "Docker is not running or not accessible: {reason}\n\
         clankercage needs a running Docker daemon that your user may access \
         (try: sudo usermod -aG docker $USER)"
    )]
    DockerUnavailable { reason: Box<str> },

    #[error("failed to run '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("devcontainer up failed with exit code {code}")]
    UpFailed { code: i32 },

    #[error("failed to pull image '{image}' (exit code {code})")]
    PullFailed { image: String, code: i32 },

    #[error("failed to determine the project directory: {0}")]
    ProjectDir(#[source] io::Error),
}

impl LaunchError {
    #[must_use]
    pub fn docker_unavailable(reason: impl Into<String>) -> Self {
        Self::DockerUnavailable {
            reason: reason.into().into_boxed_str(),
        }
    }

    #[must_use]
    pub fn command(program: impl Into<String>, source: io::Error) -> Self {
        Self::Command {
            program: program.into(),
            source,
        }
    }
}
