//! File-only tracing setup.
//!
//! The terminal belongs to the child process while a session runs, so nothing
//! is ever logged to stdout or stderr.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use instance_store::InstanceId;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "CLANKERCAGE_LOG";
pub const DEFAULT_FILTER: &str = "info";
pub const LOG_DIR: &str = "logs";
/// Per-instance log files kept in the default log directory.
pub const KEPT_LOGS: usize = 20;

/// `<cache_root>/logs/<id>.log`.
#[must_use]
pub fn default_log_path(cache_root: &Path, id: &InstanceId) -> PathBuf {
    cache_root.join(LOG_DIR).join(format!("{id}.log"))
}

/// Deletes all but the `keep` most recently modified `*.log` files in `dir`.
/// Returns how many were removed; a missing directory removes nothing.
pub fn prune_logs(dir: &Path, keep: usize) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut logs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "log") {
            let modified = entry.metadata()?.modified()?;
            logs.push((modified, path));
        }
    }
    if logs.len() <= keep {
        return Ok(0);
    }

    logs.sort_by(|a, b| b.0.cmp(&a.0));
    let mut removed = 0;
    for (_, path) in logs.into_iter().skip(keep) {
        fs::remove_file(&path)?;
        removed += 1;
    }
    Ok(removed)
}

/// Filter from `CLANKERCAGE_LOG`, falling back to `info`.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn build_subscriber(log_file: File, filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

/// Installs the global subscriber writing to `path`, creating parent directories.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = File::create(path)?;
    tracing::subscriber::set_global_default(build_subscriber(log_file, env_filter()))
        .map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    use instance_store::InstanceId;
    use tempfile::NamedTempFile;
    use tracing_subscriber::EnvFilter;

    use super::{build_subscriber, default_log_path, prune_logs};

    #[test]
    fn log_path_is_per_instance() {
        let id = InstanceId::generate();
        assert_eq!(
            default_log_path(Path::new("/cache/clankercage"), &id),
            Path::new("/cache/clankercage/logs").join(format!("{id}.log"))
        );
    }

    #[test]
    fn subscriber_writes_plain_text_to_file() {
        let log_file = NamedTempFile::new().expect("temp log");
        let subscriber = build_subscriber(
            log_file.reopen().expect("reopen"),
            EnvFilter::new("info"),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(bytes = 12, "replaying buffered input");
            tracing::debug!("poll tick");
        });

        let contents = std::fs::read_to_string(log_file.path()).expect("read log");
        assert!(contents.contains("INFO"));
        assert!(contents.contains("replaying buffered input"));
        assert!(contents.contains("bytes=12"));
        assert!(!contents.contains("poll tick"), "debug must be filtered at info");
        assert!(!contents.contains('\x1b'), "log file must not contain ANSI escapes");
    }

    fn touch(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        let file = File::create(&path).expect("create log");
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .expect("set mtime");
    }

    #[test]
    fn prune_keeps_newest_logs() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "old.log", 300);
        touch(dir.path(), "older.log", 400);
        touch(dir.path(), "new.log", 10);
        touch(dir.path(), "newer.log", 5);
        touch(dir.path(), "notes.txt", 1000);

        assert_eq!(prune_logs(dir.path(), 2).expect("prune"), 2);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, ["new.log", "newer.log", "notes.txt"]);
    }

    #[test]
    fn prune_ignores_missing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(prune_logs(&dir.path().join("logs"), 2).expect("prune"), 0);
    }
}
