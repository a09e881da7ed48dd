//! Produces the `devcontainer.json` used for one launch.
//!
//! The embedded template is rewritten per launch: project mount, image or
//! local build, read-only credential mounts, and the post-start command that
//! brings up the firewall and configures git inside the container.

mod builder;
mod error;
mod options;
mod ssh;
mod template;

pub use builder::{apply, build_config, post_start_command, write_config, CONFIG_FILE};
pub use error::ConfigError;
pub use options::{ConfigOptions, ImageSource, DEFAULT_IMAGE};
pub use ssh::{write_ssh_config, SSH_CONFIG_FILE};
pub use template::{load_template, TEMPLATE};
