//! Handing the terminal to a child without relaying.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use crate::core::exit::exit_code_from_status;

/// Replaces the current process image with `command`.
///
/// Only returns on failure; the returned error says why the exec did not happen.
pub fn exec_replace(mut command: Command) -> io::Error {
    tracing::debug!(program = ?command.get_program(), "replacing process image");
    command.exec()
}

/// Runs `command` with inherited stdio and returns its mapped exit code.
pub fn run_and_forward(mut command: Command) -> io::Result<i32> {
    let status = command.status()?;
    Ok(exit_code_from_status(status))
}
