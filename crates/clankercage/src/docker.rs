//! Thin wrappers over the `docker` CLI: daemon check, image pull and
//! provenance, and teardown of labeled containers.

use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::LaunchError;

/// `docker info` hangs when the daemon socket exists but nothing answers.
pub const INFO_TIMEOUT: Duration = Duration::from_secs(10);

const IMAGE_INFO_FORMAT: &str = concat!(
    r#"{{index .Config.Labels "org.opencontainers.image.created"}}"#,
    "|",
    r#"{{index .Config.Labels "org.opencontainers.image.source.type"}}"#,
);

/// Provenance labels of a local image. `None` when the label is missing or
/// the image could not be inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// `org.opencontainers.image.created`
    pub created: Option<String>,
    /// `org.opencontainers.image.source.type`
    pub source: Option<String>,
}

impl ImageInfo {
    fn parse(text: &str) -> Self {
        let mut parts = text.trim().splitn(2, '|');
        let mut label = || {
            parts
                .next()
                .map(str::trim)
                .filter(|value| !value.is_empty() && *value != "<no value>")
                .map(str::to_string)
        };
        Self {
            created: label(),
            source: label(),
        }
    }

    #[must_use]
    pub fn built_display(&self) -> &str {
        self.created.as_deref().unwrap_or("Unknown")
    }

    #[must_use]
    pub fn source_display(&self) -> &str {
        match self.source.as_deref() {
            Some("ghcr.io") => "GitHub Container Registry (ghcr.io)",
            _ => "Local build",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Docker {
    program: String,
    base_args: Vec<String>,
    info_timeout: Duration,
}

impl Default for Docker {
    fn default() -> Self {
        Self::new("docker", Vec::new())
    }
}

impl Docker {
    #[must_use]
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            info_timeout: INFO_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_info_timeout(mut self, timeout: Duration) -> Self {
        self.info_timeout = timeout;
        self
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(&self.base_args).args(args);
        command
    }

    /// Fails unless `docker info` succeeds within the info timeout.
    pub fn check_accessible(&self) -> Result<(), LaunchError> {
        let mut child = self
            .command(["info"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                LaunchError::docker_unavailable(format!("could not run '{}': {err}", self.program))
            })?;

        match child.wait_timeout(self.info_timeout) {
            Ok(Some(status)) if status.success() => Ok(()),
            Ok(Some(status)) => Err(LaunchError::docker_unavailable(format!(
                "`docker info` exited with {status}"
            ))),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(LaunchError::docker_unavailable(format!(
                    "`docker info` did not answer within {:?}",
                    self.info_timeout
                )))
            }
            Err(err) => {
                let _ = child.kill();
                Err(LaunchError::docker_unavailable(format!(
                    "waiting for `docker info` failed: {err}"
                )))
            }
        }
    }

    pub fn image_present(&self, image: &str) -> Result<bool, LaunchError> {
        let status = self
            .command(["image", "inspect", image])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| LaunchError::command(&self.program, source))?;
        Ok(status.success())
    }

    /// Reads the image's provenance labels. Inspection failures yield an
    /// empty [`ImageInfo`].
    #[must_use]
    pub fn image_info(&self, image: &str) -> ImageInfo {
        let output = self
            .command(["image", "inspect", image, "--format", IMAGE_INFO_FORMAT])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                ImageInfo::parse(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                tracing::debug!(image, status = %output.status, "image inspect failed");
                ImageInfo::default()
            }
            Err(err) => {
                tracing::debug!(image, error = %err, "image inspect could not run");
                ImageInfo::default()
            }
        }
    }

    /// Pulls with inherited stdio so progress is visible.
    pub fn pull(&self, image: &str) -> Result<(), LaunchError> {
        let status = self
            .command(["pull", image])
            .status()
            .map_err(|source| LaunchError::command(&self.program, source))?;
        if !status.success() {
            return Err(LaunchError::PullFailed {
                image: image.to_string(),
                code: cage_pty::exit_code_from_status(status),
            });
        }
        Ok(())
    }

    /// Returns whether a pull happened.
    pub fn pull_if_missing(&self, image: &str) -> Result<bool, LaunchError> {
        if self.image_present(image)? {
            return Ok(false);
        }
        println!("Pulling Docker image {image}...");
        tracing::info!(image, "pulling image");
        self.pull(image)?;
        Ok(true)
    }

    /// Ids of all containers, running or not, carrying `label`.
    pub fn labeled_containers(&self, label: &str) -> Result<Vec<String>, LaunchError> {
        let output = self
            .command(["ps", "-aq", "--filter"])
            .arg(format!("label={label}"))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| LaunchError::command(&self.program, source))?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    /// Force-removes every container carrying `label`. Returns how many were found.
    pub fn remove_labeled(&self, label: &str) -> Result<usize, LaunchError> {
        let ids = self.labeled_containers(label)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let status = self
            .command(["rm", "-f"])
            .args(&ids)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| LaunchError::command(&self.program, source))?;
        if !status.success() {
            tracing::warn!(label, %status, "docker rm reported failure");
        }
        Ok(ids.len())
    }
}
