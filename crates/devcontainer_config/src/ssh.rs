use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const SSH_CONFIG_FILE: &str = "ssh_config";

/// Writes an ssh client config pinning github.com to the mounted key.
pub fn write_ssh_config(runtime_dir: &Path, key_name: &str) -> Result<PathBuf, ConfigError> {
    let path = runtime_dir.join(SSH_CONFIG_FILE);
    let contents = format!(
        "Host github.com\n  HostName github.com\n  User git\n  IdentityFile /home/node/.ssh/{key_name}\n  IdentitiesOnly yes\n"
    );
    fs::write(&path, contents)
        .map_err(|source| ConfigError::io("writing ssh config", &path, source))?;
    // ssh refuses group- or world-writable config files.
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644))
        .map_err(|source| ConfigError::io("setting ssh config permissions", &path, source))?;
    Ok(path)
}
