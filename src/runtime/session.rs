//! Runs the interactive assistant on a PTY, replaying startup keystrokes first.

use std::io;
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::core::exit::exit_code_from_status;
use crate::core::terminal::TerminalIo;
use crate::error::RelayError;
use crate::platform::pty::PtyChild;
use crate::runtime::relay::{
    enter_raw_mode, reap, restore_terminal, resume_signal, InputRoute, RelayLoop,
};

#[derive(Debug)]
pub struct SessionExit {
    /// Child exit code; signal deaths map to [`crate::core::exit::SIGNAL_EXIT_CODE`].
    pub code: i32,
    pub status: ExitStatus,
    /// Set when terminal attributes could not be put back.
    pub restore_error: Option<io::Error>,
}

/// Full-duplex byte relay between the user's terminal and a PTY child.
pub struct SessionRelay {
    io: TerminalIo,
    config: RelayConfig,
}

impl SessionRelay {
    #[must_use]
    pub fn new(io: TerminalIo, config: RelayConfig) -> Self {
        Self { io, config }
    }

    /// Runs `command` until it exits or either stream closes.
    ///
    /// `replay` is written to the child before any live keystroke. EOF on the
    /// terminal input stops reading it but leaves the session running.
    pub fn run(&self, command: Command, replay: Vec<u8>) -> Result<SessionExit, RelayError> {
        let mut child = PtyChild::spawn(command, self.io.window_size())?;

        let guard = if self.io.is_interactive() {
            Some(enter_raw_mode(self.io, &mut child)?)
        } else {
            None
        };

        let mut relay = RelayLoop::new(self.io, &self.config, InputRoute::Forward);
        if !replay.is_empty() {
            debug!(bytes = replay.len(), "replaying buffered input");
            relay.queue_for_child(&replay);
        }
        let end = relay.run(&mut child);
        let unforwarded = relay.finish();

        let (process, program) = child.close_master();
        let restore_error = restore_terminal(guard, true);
        let status = reap(process, &program, end)?;
        resume_signal(unforwarded);
        let code = exit_code_from_status(status);
        info!(%program, code, "session ended");

        Ok(SessionExit {
            code,
            status,
            restore_error,
        })
    }
}
