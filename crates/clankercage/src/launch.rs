//! One launch, start to finish: docker check, instance, config, startup
//! relay, session relay, teardown.

use std::path::PathBuf;
use std::process::Command;

use cage_pty::{
    exec_replace, run_and_forward, RelayConfig, SessionRelay, StartupRelay, TerminalIo,
};
use devcontainer_config::{build_config, write_config, ConfigError, ImageSource};
use instance_store::{cache_root, Instance, InstanceId};
use tracing::{info, warn};

use crate::cli::LaunchRequest;
use crate::docker::Docker;
use crate::error::LaunchError;
use crate::runtime::{ContainerTarget, DevcontainerCli};

/// Collaborators and settings shared by every launch from this process.
#[derive(Debug, Clone)]
pub struct Launcher {
    pub docker: Docker,
    pub devcontainer: DevcontainerCli,
    pub relay: RelayConfig,
    pub io: TerminalIo,
    pub cache_root: PathBuf,
}

impl Launcher {
    /// Real docker and devcontainer CLIs, the process's stdio, and the user cache dir.
    pub fn from_env() -> Result<Self, LaunchError> {
        Ok(Self {
            docker: Docker::default(),
            devcontainer: DevcontainerCli::default(),
            relay: RelayConfig::from_env(),
            io: TerminalIo::stdio(),
            cache_root: cache_root()?,
        })
    }

    /// Runs the assistant for `request` and returns its exit code.
    ///
    /// A fresh instance is created for every call; containers are never reused.
    /// Unless the request keeps it, the container and the instance workspace
    /// are removed afterwards, whatever the outcome.
    pub fn launch(&self, request: &LaunchRequest, id: InstanceId) -> Result<i32, LaunchError> {
        if let Some(key) = &request.config.ssh_key {
            if !key.exists() {
                return Err(ConfigError::MissingSshKey { path: key.clone() }.into());
            }
        }

        self.docker.check_accessible()?;
        match &request.config.image {
            ImageSource::Image(image) => {
                self.docker.pull_if_missing(image)?;
                let info = self.docker.image_info(image);
                println!("Container image: {image}");
                println!("  Built: {}", info.built_display());
                println!("  Source: {}", info.source_display());
            }
            ImageSource::Build { context } => {
                println!("Container image: local build from {}", context.display());
            }
        }

        let instance = Instance::create_with_id(&self.cache_root, id, &request.project_dir)?;
        info!(id = %instance.id(), label = instance.label(), "launching instance");

        let result = self.run_instance(request, &instance);

        if request.keep_container {
            info!(label = instance.label(), "keeping container and workspace");
        } else {
            self.teardown(instance);
        }
        result
    }

    fn run_instance(&self, request: &LaunchRequest, instance: &Instance) -> Result<i32, LaunchError> {
        let config = build_config(&request.config, instance.devcontainer_dir())?;
        let config_path = write_config(instance.devcontainer_dir(), &config)?;
        let target = ContainerTarget {
            project_dir: &request.project_dir,
            config_path: &config_path,
            id_label: instance.label(),
        };
        let interactive = self.io.is_interactive();

        println!("Starting devcontainer (instance {})...", instance.id());
        let up = self.devcontainer.up_command(&target);
        let replay = if interactive {
            let capture = StartupRelay::new(self.io, self.relay.clone()).run(up)?;
            if let Some(err) = &capture.restore_error {
                warn!(error = %err, "terminal attributes not restored after startup");
            }
            capture.input
        } else {
            let code = self.forward(up)?;
            if code != 0 {
                return Err(LaunchError::UpFailed { code });
            }
            Vec::new()
        };

        if !replay.is_empty() {
            println!("(Replaying {} bytes of buffered input)", replay.len());
        }

        let exec = self
            .devcontainer
            .exec_command(&target, &request.assistant.argv());
        if interactive {
            let exit = SessionRelay::new(self.io, self.relay.clone()).run(exec, replay)?;
            if let Some(err) = &exit.restore_error {
                warn!(error = %err, "terminal attributes not restored after session");
            }
            Ok(exit.code)
        } else if request.keep_container {
            // Nothing left to clean up, so the assistant can take over this process.
            let program = program_name(&exec);
            Err(LaunchError::command(program, exec_replace(exec)))
        } else {
            self.forward(exec)
        }
    }

    fn forward(&self, command: Command) -> Result<i32, LaunchError> {
        let program = program_name(&command);
        run_and_forward(command).map_err(|source| LaunchError::command(program, source))
    }

    fn teardown(&self, instance: Instance) {
        match self.devcontainer.remove_instance(instance.label()) {
            Ok(removed) => info!(label = instance.label(), removed, "removed containers"),
            Err(err) => warn!(label = instance.label(), error = %err, "container removal failed"),
        }
        if let Err(err) = instance.remove() {
            warn!(error = %err, "instance workspace removal failed");
        }
    }
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}
