//! PTY bridge for interactive coding agents running in containers.
//!
//! Invariant: terminal attributes changed by a relay are restored before the
//! relay returns, on success, error and unwind alike.
//!
//! # Public API Overview
//! - Run the slow container-start command with [`StartupRelay`]; keystrokes
//!   typed meanwhile are captured into an [`InputBuffer`] instead of forwarded.
//! - Run the interactive session with [`SessionRelay`], replaying the captured
//!   bytes ahead of live input.
//! - Map child termination to a process exit code with [`exit_code_from_status`].
//! - Skip relaying entirely with [`exec_replace`] when stdin is not a terminal.

pub mod config;
pub mod core;
pub mod error;
pub mod platform;
pub mod runtime;

/// Relay tuning.
pub use crate::config::RelayConfig;
/// Startup keystroke capture.
pub use crate::core::input_buffer::InputBuffer;
/// Exit-status contract.
pub use crate::core::exit::{exit_code_from_status, SIGNAL_EXIT_CODE};
/// The terminal a relay reads from and writes to.
pub use crate::core::terminal::TerminalIo;
pub use crate::error::RelayError;
/// Raw-mode guard and PTY primitives.
pub use crate::platform::{PtyChild, RawModeGuard};
/// Relays and process handoff.
pub use crate::runtime::{
    exec_replace, run_and_forward, SessionExit, SessionRelay, StartupCapture, StartupRelay,
};
