//! Launches an AI coding assistant in an isolated devcontainer.
//!
//! Every invocation gets its own [`instance_store::Instance`]: a fresh id, a
//! private workspace directory holding the generated `devcontainer.json`, and a
//! container label nothing else shares.

pub mod assistant;
pub mod cli;
pub mod docker;
pub mod error;
pub mod launch;
pub mod logging;
pub mod runtime;

pub use assistant::AssistantCommand;
pub use cli::{Args, LaunchRequest};
pub use docker::{Docker, ImageInfo};
pub use error::LaunchError;
pub use launch::Launcher;
pub use runtime::{ContainerTarget, DevcontainerCli};
