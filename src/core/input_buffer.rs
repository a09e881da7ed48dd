//! Keystrokes captured while the container is still starting.

use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct Inner {
    bytes: Vec<u8>,
    capturing: bool,
}

/// Append-only byte accumulator with a one-way capture switch.
///
/// Each `append` lands as one contiguous run, even with concurrent callers.
/// [`InputBuffer::stop_and_get`] freezes the buffer; later appends are dropped.
#[derive(Debug)]
pub struct InputBuffer {
    inner: Mutex<Inner>,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                bytes: Vec::new(),
                capturing: true,
            }),
        }
    }

    pub fn append(&self, data: &[u8]) {
        let mut inner = self.lock();
        if inner.capturing {
            inner.bytes.extend_from_slice(data);
        }
    }

    /// Stops capturing and returns everything appended so far, in order.
    pub fn stop_and_get(&self) -> Vec<u8> {
        let mut inner = self.lock();
        inner.capturing = false;
        inner.bytes.clone()
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.lock().capturing
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
