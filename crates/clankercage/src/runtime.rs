//! Argument vectors for the devcontainer CLI.

use std::path::Path;
use std::process::Command;

use crate::docker::Docker;
use crate::error::LaunchError;

pub const DEVCONTAINER_PROGRAM: &str = "npx";
pub const DEVCONTAINER_ARGS: [&str; 2] = ["-y", "@devcontainers/cli"];

/// Identifies the one container a launch talks to.
#[derive(Debug, Clone, Copy)]
pub struct ContainerTarget<'a> {
    pub project_dir: &'a Path,
    pub config_path: &'a Path,
    pub id_label: &'a str,
}

#[derive(Debug, Clone)]
pub struct DevcontainerCli {
    program: String,
    base_args: Vec<String>,
    docker: Docker,
}

impl Default for DevcontainerCli {
    fn default() -> Self {
        Self::new(
            DEVCONTAINER_PROGRAM,
            DEVCONTAINER_ARGS.iter().map(|arg| arg.to_string()).collect(),
            Docker::default(),
        )
    }
}

impl DevcontainerCli {
    #[must_use]
    pub fn new(program: impl Into<String>, base_args: Vec<String>, docker: Docker) -> Self {
        Self {
            program: program.into(),
            base_args,
            docker,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn subcommand(&self, name: &str, target: &ContainerTarget<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .arg(name)
            .arg("--workspace-folder")
            .arg(target.project_dir)
            .arg("--config")
            .arg(target.config_path)
            .arg("--id-label")
            .arg(target.id_label);
        command
    }

    /// `devcontainer up` for the target.
    #[must_use]
    pub fn up_command(&self, target: &ContainerTarget<'_>) -> Command {
        self.subcommand("up", target)
    }

    /// `devcontainer exec` running `argv` in the target.
    #[must_use]
    pub fn exec_command(&self, target: &ContainerTarget<'_>, argv: &[String]) -> Command {
        let mut command = self.subcommand("exec", target);
        command.args(argv);
        command
    }

    /// Removes the container started for `label`, if any.
    pub fn remove_instance(&self, label: &str) -> Result<usize, LaunchError> {
        self.docker.remove_labeled(label)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::path::Path;
    use std::process::Command;

    use pretty_assertions::assert_eq;

    use super::{ContainerTarget, DevcontainerCli};

    fn argv(command: &Command) -> Vec<String> {
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(OsStr::to_string_lossy)
            .map(|arg| arg.into_owned())
            .collect()
    }

    fn target() -> ContainerTarget<'static> {
        ContainerTarget {
            project_dir: Path::new("/home/me/project"),
            config_path: Path::new("/cache/workspace-abc/.devcontainer/devcontainer.json"),
            id_label: "clankercage.instance=abc",
        }
    }

    #[test]
    fn up_command_targets_instance() {
        let cli = DevcontainerCli::default();
        assert_eq!(
            argv(&cli.up_command(&target())),
            [
                "npx",
                "-y",
                "@devcontainers/cli",
                "up",
                "--workspace-folder",
                "/home/me/project",
                "--config",
                "/cache/workspace-abc/.devcontainer/devcontainer.json",
                "--id-label",
                "clankercage.instance=abc",
            ]
        );
    }

    #[test]
    fn exec_command_appends_assistant_argv() {
        let cli = DevcontainerCli::default();
        let command = cli.exec_command(
            &target(),
            &["claude".to_string(), "--dangerously-skip-permissions".to_string()],
        );

        let argv = argv(&command);
        assert_eq!(argv[3], "exec");
        assert_eq!(
            &argv[argv.len() - 4..],
            [
                "--id-label",
                "clankercage.instance=abc",
                "claude",
                "--dangerously-skip-permissions",
            ]
        );
    }
}
