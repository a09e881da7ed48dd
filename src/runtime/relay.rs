//! Polling loop shared by the startup and session relays.
//!
//! One thread multiplexes the PTY master and the terminal input with a bounded
//! `poll(2)`, so child exit is noticed within one poll interval without a
//! dedicated wakeup channel.

use std::io;
use std::os::fd::RawFd;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use libc::c_int;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::config::RelayConfig;
use crate::core::input_buffer::InputBuffer;
use crate::core::terminal::TerminalIo;
use crate::error::RelayError;
use crate::platform::fd::{poll_fds, poll_readable, read_fd, write_all_fd, write_fd};
use crate::platform::pty::PtyChild;
use crate::platform::signals::{resume_default, SignalWatch};
use crate::platform::termios::RawModeGuard;

/// How long a child gets to exit on its own once its stream has closed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

const READABLE: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR;

/// Where keystrokes read from the terminal go.
pub(crate) enum InputRoute<'a> {
    /// Buffered for later replay; never delivered to the child.
    Capture(&'a InputBuffer),
    /// Delivered to the child after anything already queued for it.
    Forward,
}

#[derive(Debug)]
pub(crate) enum LoopEnd {
    ChildExited(ExitStatus),
    /// EOF or an I/O error on one of the streams; the child may still be running.
    StreamClosed,
}

pub(crate) struct RelayLoop<'a> {
    io: TerminalIo,
    config: &'a RelayConfig,
    route: InputRoute<'a>,
    to_child: Vec<u8>,
    input_open: bool,
    signals: Option<SignalWatch>,
    buf: Vec<u8>,
}

impl<'a> RelayLoop<'a> {
    pub(crate) fn new(io: TerminalIo, config: &'a RelayConfig, route: InputRoute<'a>) -> Self {
        let signals = match SignalWatch::install() {
            Ok(watch) => Some(watch),
            Err(err) => {
                warn!(error = %err, "signal forwarding unavailable");
                None
            }
        };

        Self {
            io,
            config,
            route,
            to_child: Vec::new(),
            input_open: true,
            signals,
            buf: vec![0u8; config.read_chunk.max(1)],
        }
    }

    /// Stops reading the terminal input entirely.
    pub(crate) fn ignore_input(&mut self) {
        self.input_open = false;
    }

    /// Queues bytes for the child ahead of any live input.
    pub(crate) fn queue_for_child(&mut self, bytes: &[u8]) {
        self.to_child.extend_from_slice(bytes);
    }

    /// Ends signal capture. Returns a termination signal that arrived after
    /// the last forwarding pass, so the caller can act on it once the
    /// terminal is back to normal.
    pub(crate) fn finish(self) -> Option<c_int> {
        self.signals.and_then(SignalWatch::finish)
    }

    pub(crate) fn run(&mut self, child: &mut PtyChild) -> LoopEnd {
        let master = child.master_fd();
        if let Err(err) = self.flush_to_child(master) {
            debug!(error = %err, "initial write to pty failed");
            return LoopEnd::StreamClosed;
        }

        loop {
            self.handle_signals(child);

            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(?status, "child exited; draining pty output");
                    self.drain_output(master);
                    return LoopEnd::ChildExited(status);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(error = %err, "non-blocking wait failed");
                    return LoopEnd::StreamClosed;
                }
            }

            match self.step(master) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("pty stream closed");
                    return LoopEnd::StreamClosed;
                }
                Err(err) => {
                    debug!(error = %err, "relay i/o error; ending session");
                    return LoopEnd::StreamClosed;
                }
            }
        }
    }

    /// One readiness wait plus whatever transfers it allows. `Ok(false)` once
    /// the PTY side has closed.
    fn step(&mut self, master: RawFd) -> io::Result<bool> {
        let mut master_events = libc::POLLIN;
        if !self.to_child.is_empty() {
            master_events |= libc::POLLOUT;
        }
        let mut fds = [
            libc::pollfd {
                fd: master,
                events: master_events,
                revents: 0,
            },
            libc::pollfd {
                // poll(2) skips negative descriptors.
                fd: if self.input_open { self.io.input_fd } else { -1 },
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        if poll_fds(&mut fds, self.config.poll_timeout_ms())? == 0 {
            return Ok(true);
        }

        let master_revents = fds[0].revents;
        if (master_revents & libc::POLLNVAL) != 0 {
            return Ok(false);
        }
        if (master_revents & libc::POLLOUT) != 0 {
            self.flush_to_child(master)?;
        }
        if (master_revents & READABLE) != 0 && !self.pump_output(master)? {
            return Ok(false);
        }

        let input_revents = fds[1].revents;
        if (input_revents & libc::POLLNVAL) != 0 {
            self.input_open = false;
        } else if (input_revents & READABLE) != 0 {
            self.pump_input(master)?;
        }

        Ok(true)
    }

    /// Copies one chunk from the PTY to the terminal, verbatim.
    fn pump_output(&mut self, master: RawFd) -> io::Result<bool> {
        match read_fd(master, &mut self.buf) {
            Ok(0) => Ok(false),
            Ok(n) => {
                write_all_fd(self.io.output_fd, &self.buf[..n])?;
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(true),
            // Linux reports a hung-up slave as EIO rather than EOF.
            Err(err) if err.raw_os_error() == Some(libc::EIO) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn pump_input(&mut self, master: RawFd) -> io::Result<()> {
        let n = read_fd(self.io.input_fd, &mut self.buf)?;
        if n == 0 {
            debug!("terminal input reached EOF");
            self.input_open = false;
            return Ok(());
        }

        match self.route {
            InputRoute::Capture(buffer) => buffer.append(&self.buf[..n]),
            InputRoute::Forward => {
                self.to_child.extend_from_slice(&self.buf[..n]);
                self.flush_to_child(master)?;
            }
        }
        Ok(())
    }

    /// Writes as much queued input as the PTY accepts without blocking.
    fn flush_to_child(&mut self, master: RawFd) -> io::Result<()> {
        while !self.to_child.is_empty() {
            match write_fd(master, &self.to_child) {
                Ok(0) => break,
                Ok(n) => {
                    self.to_child.drain(..n);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn drain_output(&mut self, master: RawFd) {
        while poll_readable(master, self.config.poll_timeout_ms()) {
            match self.pump_output(master) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    debug!(error = %err, "drain stopped");
                    break;
                }
            }
        }
    }

    fn handle_signals(&self, child: &PtyChild) {
        let Some(signals) = self.signals.as_ref() else {
            return;
        };

        if let Some(signal) = signals.take_pending() {
            debug!(signal, pid = child.pid(), "forwarding signal to child");
            if let Err(err) = child.signal_group(signal) {
                debug!(error = %err, "signal forwarding failed");
            }
        }

        if signals.take_resized() {
            if let Some(size) = self.io.window_size() {
                if let Err(err) = child.resize(&size) {
                    debug!(error = %err, "pty resize failed");
                }
            }
        }
    }
}

/// Switches the terminal to raw mode for a freshly spawned child.
///
/// If that fails the child is hung up and reaped before the error returns, so
/// nothing is left running against a terminal nobody relays.
pub(crate) fn enter_raw_mode(io: TerminalIo, child: &mut PtyChild) -> Result<RawModeGuard, RelayError> {
    RawModeGuard::enter(io.input_fd).map_err(|err| {
        abandon(child);
        RelayError::RawMode(err)
    })
}

fn abandon(child: &mut PtyChild) {
    debug!(pid = child.pid(), "abandoning child; sending SIGHUP");
    if let Err(err) = child.signal_group(libc::SIGHUP) {
        debug!(error = %err, "SIGHUP to child group failed");
    }
    match child.wait_timeout(EXIT_GRACE) {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(err) => {
            debug!(error = %err, "wait for abandoned child failed");
            return;
        }
    }
    if let Err(err) = child.signal_group(libc::SIGKILL) {
        debug!(error = %err, "SIGKILL to child group failed");
    }
    if let Err(err) = child.wait() {
        debug!(error = %err, "reaping abandoned child failed");
    }
}

/// Gives a termination signal the relay held back its default effect.
pub(crate) fn resume_signal(signal: Option<c_int>) {
    if let Some(signal) = signal {
        if let Err(err) = resume_default(signal) {
            warn!(signal, error = %err, "could not re-deliver signal");
        }
    }
}

/// Restores terminal attributes, reporting rather than propagating failure.
pub(crate) fn restore_terminal(guard: Option<RawModeGuard>, discard_input: bool) -> Option<io::Error> {
    let guard = guard?;
    let result = if discard_input {
        guard.restore_discarding_input()
    } else {
        guard.restore()
    };
    match result {
        Ok(()) => None,
        Err(err) => {
            warn!(error = %err, "failed to restore terminal attributes");
            Some(err)
        }
    }
}

/// Reaps the child after its master end has been closed.
///
/// A child that outlives its stream gets a short grace period, then `SIGHUP`
/// to its process group, as a closed terminal would deliver.
pub(crate) fn reap(mut process: Child, program: &str, end: LoopEnd) -> Result<ExitStatus, RelayError> {
    let wait_error = |source| RelayError::Wait {
        program: program.to_string(),
        source,
    };

    if let LoopEnd::ChildExited(status) = end {
        return Ok(status);
    }

    if let Some(status) = process.wait_timeout(EXIT_GRACE).map_err(wait_error)? {
        return Ok(status);
    }

    debug!(pid = process.id(), "child outlived its stream; sending SIGHUP");
    unsafe {
        libc::killpg(process.id() as libc::pid_t, libc::SIGHUP);
    }
    process.wait().map_err(wait_error)
}

#[cfg(test)]
mod tests {
    use std::process::Command;
    use std::time::{Duration, Instant};

    use super::abandon;
    use crate::platform::pty::PtyChild;

    fn spawn(script: &str) -> PtyChild {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        PtyChild::spawn(command, None).expect("spawn child")
    }

    #[test]
    fn abandoned_child_is_hung_up_and_reaped() {
        let mut child = spawn("sleep 30");

        let started = Instant::now();
        abandon(&mut child);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().expect("try_wait").is_some());
    }

    #[test]
    fn child_ignoring_hangup_is_killed() {
        let mut child = spawn("trap '' HUP; while :; do sleep 0.1; done");
        std::thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        abandon(&mut child);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().expect("try_wait").is_some());
    }
}
