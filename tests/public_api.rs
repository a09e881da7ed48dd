#![allow(unused_imports)]

use cage_pty::platform::{
    get_termios, is_tty, open_pty, read_winsize, set_termios, termios_bytes, PtyPair, SignalWatch,
};
use cage_pty::{
    exec_replace, exit_code_from_status, run_and_forward, InputBuffer, PtyChild, RawModeGuard,
    RelayConfig, RelayError, SessionExit, SessionRelay, StartupCapture, StartupRelay, TerminalIo,
    SIGNAL_EXIT_CODE,
};

#[test]
fn public_api_exports_compile() {}
