//! Mapping child termination to a process exit code.

use std::process::ExitStatus;

/// Exit code reported when the child was killed by a signal.
pub const SIGNAL_EXIT_CODE: i32 = 1;

#[must_use]
pub fn exit_code_from_status(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNAL_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use super::{exit_code_from_status, SIGNAL_EXIT_CODE};

    #[test]
    fn normal_exit_codes_pass_through() {
        assert_eq!(exit_code_from_status(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code_from_status(ExitStatus::from_raw(7 << 8)), 7);
    }

    #[test]
    fn signal_death_maps_to_fixed_code() {
        let killed = ExitStatus::from_raw(libc::SIGKILL);
        assert_eq!(exit_code_from_status(killed), SIGNAL_EXIT_CODE);
    }
}
