//! Relays that drive a child process on a PTY, and the non-relaying handoff.

mod relay;

pub mod handoff;
pub mod session;
pub mod startup;

pub use handoff::{exec_replace, run_and_forward};
pub use session::{SessionExit, SessionRelay};
pub use startup::{StartupCapture, StartupRelay};
