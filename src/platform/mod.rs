//! POSIX terminal, PTY and signal plumbing.

pub mod fd;
pub mod pty;
pub mod signals;
pub mod termios;

pub use fd::is_tty;
pub use pty::{open_pty, read_winsize, write_winsize, PtyChild, PtyPair};
pub use signals::{resume_default, SignalWatch};
pub use termios::{get_termios, set_termios, termios_bytes, RawModeGuard};
