//! Signal capture while a relay owns the terminal.
//!
//! With the terminal in raw mode the host process must not die from a
//! termination signal before restoring it, so those signals are recorded here
//! and forwarded to the child by the relay loop instead. Outside a watch they
//! keep their default action.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use libc::c_int;
use signal_hook::SigId;

pub const FORWARDED_SIGNALS: [c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Live watch count and the flag that arms the default action when it drops
/// to zero.
struct Fallback {
    active: usize,
    use_default: Arc<AtomicBool>,
}

static FALLBACK: Mutex<Option<Fallback>> = Mutex::new(None);

/// Disarms the default action for the lifetime of one watch.
///
/// The first call registers, once per process, an action that runs the default
/// behavior of each forwarded signal whenever no watch is live. signal-hook
/// never removes its own handler, so unregistering a watch's action alone
/// would leave these signals ignored.
fn enter_watch() -> io::Result<()> {
    let mut state = FALLBACK.lock().unwrap_or_else(PoisonError::into_inner);
    if state.is_none() {
        let use_default = Arc::new(AtomicBool::new(true));
        for signal in FORWARDED_SIGNALS {
            signal_hook::flag::register_conditional_default(signal, Arc::clone(&use_default))?;
        }
        *state = Some(Fallback {
            active: 0,
            use_default,
        });
    }
    if let Some(fallback) = state.as_mut() {
        fallback.active += 1;
        fallback.use_default.store(false, Ordering::SeqCst);
    }
    Ok(())
}

fn leave_watch() {
    let mut state = FALLBACK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(fallback) = state.as_mut() {
        fallback.active = fallback.active.saturating_sub(1);
        if fallback.active == 0 {
            fallback.use_default.store(true, Ordering::SeqCst);
        }
    }
}

pub struct SignalWatch {
    pending: Arc<AtomicUsize>,
    resized: Arc<AtomicBool>,
    ids: Vec<SigId>,
}

impl SignalWatch {
    pub fn install() -> io::Result<Self> {
        enter_watch()?;
        let pending = Arc::new(AtomicUsize::new(0));
        let resized = Arc::new(AtomicBool::new(false));

        // From here on Drop undoes the registrations made so far.
        let mut watch = Self {
            pending: Arc::clone(&pending),
            resized: Arc::clone(&resized),
            ids: Vec::with_capacity(FORWARDED_SIGNALS.len() + 1),
        };

        for signal in FORWARDED_SIGNALS {
            let id = signal_hook::flag::register_usize(signal, Arc::clone(&pending), signal as usize)?;
            watch.ids.push(id);
        }
        watch
            .ids
            .push(signal_hook::flag::register(libc::SIGWINCH, resized)?);

        Ok(watch)
    }

    /// Most recent termination signal since the last call, if any.
    pub fn take_pending(&self) -> Option<c_int> {
        match self.pending.swap(0, Ordering::SeqCst) {
            0 => None,
            signal => Some(signal as c_int),
        }
    }

    pub fn take_resized(&self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }

    /// Ends the watch, returning a termination signal that arrived but was
    /// never taken.
    pub fn finish(self) -> Option<c_int> {
        self.take_pending()
    }
}

impl Drop for SignalWatch {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
        leave_watch();
    }
}

/// Applies the default action of `signal` to this process, as if no watch had
/// ever caught it. Termination signals do not return.
pub fn resume_default(signal: c_int) -> io::Result<()> {
    tracing::debug!(signal, "re-delivering signal left over from the relay");
    signal_hook::low_level::emulate_default_handler(signal)
}

#[cfg(test)]
mod tests {
    use super::SignalWatch;

    #[test]
    fn records_window_resize() {
        let watch = SignalWatch::install().expect("install signal watch");
        assert!(!watch.take_resized());

        unsafe {
            libc::raise(libc::SIGWINCH);
        }

        assert!(watch.take_resized());
        assert!(!watch.take_resized(), "flag must reset after being taken");
        assert_eq!(watch.finish(), None);
    }

    #[test]
    fn finish_returns_untaken_signal() {
        let watch = SignalWatch::install().expect("install signal watch");
        watch.pending.store(libc::SIGHUP as usize, std::sync::atomic::Ordering::SeqCst);

        assert_eq!(watch.finish(), Some(libc::SIGHUP));
    }
}
