//! Terminal attribute access and the scoped raw-mode guard.

use std::io;
use std::os::fd::RawFd;

pub fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

pub fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Byte view of a `termios` value, for exact before/after comparisons.
#[must_use]
pub fn termios_bytes(termios: &libc::termios) -> Vec<u8> {
    let ptr = termios as *const libc::termios as *const u8;
    unsafe { std::slice::from_raw_parts(ptr, std::mem::size_of::<libc::termios>()) }.to_vec()
}

/// Raw mode over one terminal fd, restored exactly once.
///
/// [`RawModeGuard::restore`] reports restoration failures to the caller; any
/// path that skips it (early return, `?`, unwinding) restores from `Drop`
/// instead, best effort.
pub struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
    restored: bool,
}

impl RawModeGuard {
    /// Saves the current attributes of `fd` and switches it to raw mode.
    ///
    /// When reading the attributes fails nothing has been changed yet.
    pub fn enter(fd: RawFd) -> io::Result<Self> {
        let saved = get_termios(fd)?;
        let mut raw = saved;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(fd, &raw)?;
        tracing::debug!(fd, "terminal switched to raw mode");
        Ok(Self {
            fd,
            saved,
            restored: false,
        })
    }

    #[must_use]
    pub fn saved(&self) -> &libc::termios {
        &self.saved
    }

    pub fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        set_termios(self.fd, &self.saved)
    }

    /// Discards unread input before restoring so leftover keystrokes do not
    /// leak into whatever reads the terminal next.
    pub fn restore_discarding_input(self) -> io::Result<()> {
        let _ = unsafe { libc::tcflush(self.fd, libc::TCIFLUSH) };
        self.restore()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restored = true;
            let _ = set_termios(self.fd, &self.saved);
        }
    }
}
