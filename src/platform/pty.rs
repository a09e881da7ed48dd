//! Pseudo-terminal allocation and child processes attached to a PTY slave.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use libc::c_int;
use wait_timeout::ChildExt;

use crate::error::RelayError;
use crate::platform::fd::{set_cloexec, set_nonblocking};

pub struct PtyPair {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

/// Opens a PTY pair, both ends close-on-exec.
pub fn open_pty(size: Option<libc::winsize>) -> io::Result<PtyPair> {
    let mut master: c_int = -1;
    let mut slave: c_int = -1;
    let mut size = size;
    let size_ptr = size
        .as_mut()
        .map_or(std::ptr::null_mut(), |size| size as *mut libc::winsize);
    let result = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            size_ptr,
        )
    };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: openpty succeeded, both descriptors are fresh and owned here.
    let pair = unsafe {
        PtyPair {
            master: OwnedFd::from_raw_fd(master),
            slave: OwnedFd::from_raw_fd(slave),
        }
    };
    set_cloexec(pair.master.as_raw_fd())?;
    set_cloexec(pair.slave.as_raw_fd())?;
    Ok(pair)
}

pub fn read_winsize(fd: RawFd) -> Option<libc::winsize> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some(size)
    } else {
        None
    }
}

pub fn write_winsize(fd: RawFd, size: &libc::winsize) -> io::Result<()> {
    let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, size as *const libc::winsize) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// A child process whose stdio is a PTY slave, plus the master end we relay.
pub struct PtyChild {
    master: OwnedFd,
    child: Child,
    program: String,
}

impl PtyChild {
    /// Spawns `command` in a new session with the PTY slave as its controlling
    /// terminal and as fds 0, 1 and 2.
    ///
    /// The command is consumed so the parent's copies of the slave are closed
    /// before this returns; otherwise the master would never see end-of-stream.
    pub fn spawn(mut command: Command, size: Option<libc::winsize>) -> Result<Self, RelayError> {
        let program = command.get_program().to_string_lossy().into_owned();
        let pty = open_pty(size).map_err(RelayError::OpenPty)?;

        let stdin = pty.slave.try_clone().map_err(RelayError::OpenPty)?;
        let stdout = pty.slave.try_clone().map_err(RelayError::OpenPty)?;
        command
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(pty.slave));

        // SAFETY: only async-signal-safe calls between fork and exec.
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                if libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = command.spawn().map_err(|source| RelayError::Spawn {
            program: program.clone(),
            source,
        })?;
        drop(command);

        set_nonblocking(pty.master.as_raw_fd(), true).map_err(RelayError::OpenPty)?;
        tracing::debug!(pid = child.id(), %program, "spawned child on pty");

        Ok(Self {
            master: pty.master,
            child,
            program,
        })
    }

    #[must_use]
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    pub fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        self.child.wait_timeout(timeout)
    }

    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Sends `signal` to the child's process group (the child leads its own session).
    pub fn signal_group(&self, signal: c_int) -> io::Result<()> {
        let pgid = self.child.id() as libc::pid_t;
        if unsafe { libc::killpg(pgid, signal) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn resize(&self, size: &libc::winsize) -> io::Result<()> {
        write_winsize(self.master.as_raw_fd(), size)
    }

    /// Closes the master end; returns the child handle for reaping.
    pub(crate) fn close_master(self) -> (Child, String) {
        let Self {
            master,
            child,
            program,
        } = self;
        drop(master);
        (child, program)
    }
}
