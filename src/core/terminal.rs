//! The controlling-terminal side of a relay.

use std::os::fd::RawFd;

use crate::platform::fd::is_tty;
use crate::platform::pty::read_winsize;

/// File descriptors standing in for the user's terminal.
///
/// Production code relays the process's own stdin/stdout; tests substitute a
/// PTY slave or pipe ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalIo {
    pub input_fd: RawFd,
    pub output_fd: RawFd,
}

impl Default for TerminalIo {
    fn default() -> Self {
        Self::stdio()
    }
}

impl TerminalIo {
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            input_fd: libc::STDIN_FILENO,
            output_fd: libc::STDOUT_FILENO,
        }
    }

    #[must_use]
    pub fn new(input_fd: RawFd, output_fd: RawFd) -> Self {
        Self {
            input_fd,
            output_fd,
        }
    }

    /// Whether the input side is an interactive terminal.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        is_tty(self.input_fd)
    }

    /// Current window size, read from whichever side is a terminal.
    #[must_use]
    pub fn window_size(&self) -> Option<libc::winsize> {
        read_winsize(self.output_fd).or_else(|| read_winsize(self.input_fd))
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::AsRawFd;

    use super::TerminalIo;
    use crate::platform::pty::open_pty;

    #[test]
    fn stdio_uses_standard_descriptors() {
        let io = TerminalIo::stdio();
        assert_eq!(io.input_fd, libc::STDIN_FILENO);
        assert_eq!(io.output_fd, libc::STDOUT_FILENO);
    }

    #[test]
    fn pty_slave_is_interactive_and_pipe_is_not() {
        let pty = open_pty(None).expect("openpty");
        let slave = pty.slave.as_raw_fd();
        assert!(TerminalIo::new(slave, slave).is_interactive());

        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert!(!TerminalIo::new(fds[0], fds[1]).is_interactive());
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }
}
