//! Runs the container-startup command on a PTY while buffering keystrokes.

use std::io;
use std::process::Command;

use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::core::input_buffer::InputBuffer;
use crate::core::terminal::TerminalIo;
use crate::error::RelayError;
use crate::platform::pty::PtyChild;
use crate::runtime::relay::{
    enter_raw_mode, reap, restore_terminal, resume_signal, InputRoute, RelayLoop,
};

/// What the user typed while startup ran.
#[derive(Debug)]
pub struct StartupCapture {
    /// Captured keystrokes, in arrival order, for replay into the session.
    pub input: Vec<u8>,
    /// Set when terminal attributes could not be put back.
    pub restore_error: Option<io::Error>,
}

/// Shows startup output live while holding user input back from the startup
/// command, so early typing reaches the assistant instead of the tooling.
pub struct StartupRelay {
    io: TerminalIo,
    config: RelayConfig,
}

impl StartupRelay {
    #[must_use]
    pub fn new(io: TerminalIo, config: RelayConfig) -> Self {
        Self { io, config }
    }

    /// Runs `command` to completion.
    ///
    /// Output is copied to the terminal unmodified. When the terminal input is
    /// interactive it is switched to raw mode and every byte read is captured
    /// rather than forwarded. Terminal attributes are restored before this
    /// returns, on every path.
    pub fn run(&self, command: Command) -> Result<StartupCapture, RelayError> {
        let interactive = self.io.is_interactive();
        let mut child = PtyChild::spawn(command, self.io.window_size())?;

        let guard = if interactive {
            Some(enter_raw_mode(self.io, &mut child)?)
        } else {
            None
        };

        let buffer = InputBuffer::new();
        let mut relay = RelayLoop::new(self.io, &self.config, InputRoute::Capture(&buffer));
        if !interactive {
            relay.ignore_input();
        }
        let end = relay.run(&mut child);
        let unforwarded = relay.finish();

        let (process, program) = child.close_master();
        let restore_error = restore_terminal(guard, false);
        let status = reap(process, &program, end)?;
        resume_signal(unforwarded);
        let input = buffer.stop_and_get();

        if !status.success() {
            debug!(?status, %program, "startup command failed");
            return Err(RelayError::StartupFailed {
                program,
                code: status.code(),
            });
        }

        if !input.is_empty() {
            info!(bytes = input.len(), "captured keystrokes during startup");
        }
        Ok(StartupCapture {
            input,
            restore_error,
        })
    }
}
