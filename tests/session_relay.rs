mod support;

use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::time::{Duration, Instant};

use cage_pty::platform::open_pty;
use cage_pty::{RelayError, SessionRelay, TerminalIo, SIGNAL_EXIT_CODE};
use pretty_assertions::assert_eq;
use support::{
    closed_input, fake_terminal, fast_config, pipe, raw, read_to_end, read_trimmed, sh,
    termios_snapshot,
};

#[test]
fn replayed_input_reaches_child_before_live_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("seen");

    let (stdin_read, stdin_write) = pipe();
    let mut live = std::fs::File::from(stdin_write);
    live.write_all(b"second\n").expect("write live input");
    drop(live);
    let (stdout_read, stdout_write) = pipe();

    let mut command = sh(r#"read a; read b; printf '%s|%s' "$a" "$b" > "$OUT""#);
    command.env("OUT", &out);
    let relay = SessionRelay::new(
        TerminalIo::new(raw(&stdin_read), raw(&stdout_write)),
        fast_config(),
    );
    let exit = relay.run(command, b"first\n".to_vec()).expect("session");
    drop(stdout_write);
    let _echo = read_to_end(stdout_read);

    assert_eq!(exit.code, 0);
    assert_eq!(read_trimmed(&out), "first|second");
}

#[test]
fn exit_codes_propagate() {
    for (script, expected) in [("exit 0", 0), ("exit 7", 7), ("kill -9 $$", SIGNAL_EXIT_CODE)] {
        let stdin = closed_input();
        let (stdout_read, stdout_write) = pipe();
        let relay = SessionRelay::new(TerminalIo::new(raw(&stdin), raw(&stdout_write)), fast_config());

        let exit = relay.run(sh(script), Vec::new()).expect("session");
        drop(stdout_write);
        let _ = read_to_end(stdout_read);

        assert_eq!(exit.code, expected, "script: {script}");
    }
}

#[test]
fn signal_death_keeps_the_signal_in_status() {
    let stdin = closed_input();
    let (_stdout_read, stdout_write) = pipe();
    let relay = SessionRelay::new(TerminalIo::new(raw(&stdin), raw(&stdout_write)), fast_config());

    let exit = relay.run(sh("kill -9 $$"), Vec::new()).expect("session");

    assert_eq!(exit.status.signal(), Some(libc::SIGKILL));
    assert_eq!(exit.code, SIGNAL_EXIT_CODE);
}

#[test]
fn child_output_passes_through_byte_for_byte() {
    let stdin = closed_input();
    let (stdout_read, stdout_write) = pipe();
    let relay = SessionRelay::new(TerminalIo::new(raw(&stdin), raw(&stdout_write)), fast_config());

    let exit = relay
        .run(sh(r"printf '\033[31mred\033[0m\007\033[2J'"), Vec::new())
        .expect("session");
    drop(stdout_write);

    assert_eq!(exit.code, 0);
    assert_eq!(read_to_end(stdout_read), b"\x1b[31mred\x1b[0m\x07\x1b[2J".to_vec());
}

#[test]
fn terminal_attributes_restored_after_normal_exit() {
    let term = fake_terminal();
    let before = termios_snapshot(raw(&term.slave));
    let relay = SessionRelay::new(TerminalIo::new(raw(&term.slave), raw(&term.slave)), fast_config());

    let exit = relay.run(sh("printf ok"), Vec::new()).expect("session");

    assert_eq!(exit.code, 0);
    assert!(exit.restore_error.is_none());
    assert_eq!(termios_snapshot(raw(&term.slave)), before);
}

#[test]
fn terminal_attributes_restored_when_output_breaks() {
    let term = fake_terminal();
    let before = termios_snapshot(raw(&term.slave));
    let (stdout_read, stdout_write) = pipe();
    drop(stdout_read);
    let relay = SessionRelay::new(TerminalIo::new(raw(&term.slave), raw(&stdout_write)), fast_config());

    let started = Instant::now();
    let exit = relay.run(sh("printf hi; sleep 30"), Vec::new()).expect("session");

    assert!(started.elapsed() < Duration::from_secs(10), "child was not hung up");
    assert_eq!(exit.code, SIGNAL_EXIT_CODE);
    assert_eq!(termios_snapshot(raw(&term.slave)), before);
}

#[test]
fn spawn_failure_leaves_terminal_untouched() {
    let term = fake_terminal();
    let before = termios_snapshot(raw(&term.slave));
    let relay = SessionRelay::new(TerminalIo::new(raw(&term.slave), raw(&term.slave)), fast_config());

    let err = relay
        .run(
            std::process::Command::new("/nonexistent/definitely-not-a-program"),
            b"lost".to_vec(),
        )
        .expect_err("spawn must fail");

    assert!(matches!(err, RelayError::Spawn { .. }), "got {err:?}");
    assert_eq!(termios_snapshot(raw(&term.slave)), before);
}

#[test]
fn child_inherits_terminal_window_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("size");
    let size = libc::winsize {
        ws_row: 40,
        ws_col: 120,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let term = open_pty(Some(size)).expect("openpty");
    let relay = SessionRelay::new(TerminalIo::new(raw(&term.slave), raw(&term.slave)), fast_config());

    let mut command = sh(r#"stty size > "$OUT""#);
    command.env("OUT", &out);
    let exit = relay.run(command, Vec::new()).expect("session");

    assert_eq!(exit.code, 0);
    assert_eq!(read_trimmed(&out), "40 120");
}
