#![allow(dead_code)]

use std::fs::File;
use std::io::Read;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use cage_pty::platform::{get_termios, open_pty, termios_bytes, PtyPair};
use cage_pty::RelayConfig;

pub fn pipe() -> (OwnedFd, OwnedFd) {
    let mut fds = [0; 2];
    let result = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(result, 0, "pipe failed");
    // SAFETY: pipe succeeded, both descriptors are fresh.
    unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

/// A pipe whose write end is already closed, so reads see EOF immediately.
pub fn closed_input() -> OwnedFd {
    let (read, write) = pipe();
    drop(write);
    read
}

/// A PTY pair whose slave stands in for the user's controlling terminal.
pub fn fake_terminal() -> PtyPair {
    open_pty(None).expect("openpty")
}

pub fn sh(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", script]);
    command
}

pub fn fast_config() -> RelayConfig {
    RelayConfig {
        poll_interval: Duration::from_millis(20),
        ..RelayConfig::default()
    }
}

/// Reads a pipe until EOF; the caller must have dropped every write end.
pub fn read_to_end(read: OwnedFd) -> Vec<u8> {
    let mut out = Vec::new();
    File::from(read).read_to_end(&mut out).expect("read pipe");
    out
}

pub fn termios_snapshot(fd: RawFd) -> Vec<u8> {
    termios_bytes(&get_termios(fd).expect("tcgetattr"))
}

pub fn read_trimmed(path: &Path) -> String {
    std::fs::read_to_string(path)
        .expect("read child output file")
        .trim()
        .to_string()
}

pub fn raw(fd: &OwnedFd) -> RawFd {
    fd.as_raw_fd()
}

/// Blocks until `path` exists; fails the test after a few seconds.
pub fn wait_for_file(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        std::thread::sleep(Duration::from_millis(10));
    }
}
