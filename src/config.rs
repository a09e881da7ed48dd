//! Relay tuning, read from the environment.

use std::env;
use std::time::Duration;

pub const POLL_MS_ENV: &str = "CAGE_PTY_POLL_MS";
pub const READ_CHUNK_ENV: &str = "CAGE_PTY_READ_CHUNK";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Upper bound on one readiness wait; also how often child liveness is checked.
    pub poll_interval: Duration,
    /// Bytes read per `read(2)` on either side.
    pub read_chunk: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `lookup`, which maps a variable name to its value.
    /// Missing, zero or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };

        Self {
            poll_interval: positive(POLL_MS_ENV)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            read_chunk: positive(READ_CHUNK_ENV)
                .and_then(|value| usize::try_from(value).ok())
                .unwrap_or(DEFAULT_READ_CHUNK),
        }
    }

    pub(crate) fn poll_timeout_ms(&self) -> libc::c_int {
        self.poll_interval
            .as_millis()
            .min(libc::c_int::MAX as u128) as libc::c_int
    }
}
