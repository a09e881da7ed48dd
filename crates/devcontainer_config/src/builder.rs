use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::error::ConfigError;
use crate::options::{ConfigOptions, ImageSource};
use crate::ssh::write_ssh_config;
use crate::template::load_template;

pub const CONFIG_FILE: &str = "devcontainer.json";

const FIREWALL_INIT: &str = "sudo /usr/local/bin/init-firewall.sh";
const CLAUDE_CONFIG_MARKER: &str = "claude-code-config";
const CLAUDE_CONFIG_BIND: &str =
    "source=${localEnv:HOME}/.claude,target=/home/node/.claude,type=bind,readonly";
const GNUPG_BIND: &str = "source=${localEnv:HOME}/.gnupg,target=/home/node/.gnupg,type=bind,readonly";

/// Loads the embedded template and applies `options` to it.
pub fn build_config(options: &ConfigOptions, runtime_dir: &Path) -> Result<Value, ConfigError> {
    let mut config = load_template()?;
    apply(&mut config, options, runtime_dir)?;
    Ok(config)
}

/// Rewrites `config` in place for one launch.
///
/// `runtime_dir` receives generated files (the ssh config) that are bind
/// mounted into the container.
pub fn apply(
    config: &mut Value,
    options: &ConfigOptions,
    runtime_dir: &Path,
) -> Result<(), ConfigError> {
    let object = config.as_object_mut().ok_or(ConfigError::NotAnObject)?;

    match &options.image {
        ImageSource::Image(image) => {
            object.remove("build");
            object.insert("image".to_string(), Value::String(image.clone()));
        }
        ImageSource::Build { context } => {
            object.remove("image");
            object.insert(
                "build".to_string(),
                json!({
                    "dockerfile": context.join("Dockerfile").display().to_string(),
                    "context": context.display().to_string(),
                }),
            );
        }
    }

    object.insert(
        "workspaceMount".to_string(),
        Value::String(format!(
            "source={},target=/workspace,type=bind,consistency=delegated",
            options.project_dir.display()
        )),
    );

    let had_mounts = object.contains_key("mounts");
    let mut mounts = rewrite_mounts(object);

    if let Some(key) = &options.ssh_key {
        let key_path = fs::canonicalize(key)
            .map_err(|_| ConfigError::MissingSshKey { path: key.clone() })?;
        let key_name = key_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ConfigError::MissingSshKey { path: key.clone() })?;
        let ssh_config = write_ssh_config(runtime_dir, &key_name)?;

        mounts.push(Value::String(format!(
            "source={},target=/home/node/.ssh/{key_name},type=bind,readonly",
            key_path.display()
        )));
        mounts.push(Value::String(format!(
            "source={},target=/home/node/.ssh/config,type=bind,readonly",
            ssh_config.display()
        )));
    }

    if options.gpg_key_id.is_some() {
        mounts.push(Value::String(GNUPG_BIND.to_string()));
    }

    if had_mounts || !mounts.is_empty() {
        object.insert("mounts".to_string(), Value::Array(mounts));
    }

    object.insert(
        "postStartCommand".to_string(),
        Value::String(post_start_command(options)),
    );

    tracing::debug!(
        project = %options.project_dir.display(),
        ssh = options.ssh_key.is_some(),
        gpg = options.gpg_key_id.is_some(),
        "applied launch options to devcontainer config"
    );
    Ok(())
}

/// Swaps the writable `.claude` volume for a read-only bind of the host
/// directory and drops any credential mounts already present.
fn rewrite_mounts(object: &mut Map<String, Value>) -> Vec<Value> {
    let Some(Value::Array(existing)) = object.remove("mounts") else {
        return Vec::new();
    };

    existing
        .into_iter()
        .filter_map(|mount| match mount {
            Value::String(text) if text.contains(".ssh/") || text.contains(".gnupg") => None,
            Value::String(text) if text.contains(CLAUDE_CONFIG_MARKER) => {
                Some(Value::String(CLAUDE_CONFIG_BIND.to_string()))
            }
            other => Some(other),
        })
        .collect()
}

/// Commands run on every container start, joined with `&&`.
///
/// Firewall setup always comes first. User-supplied values are shell-quoted.
#[must_use]
pub fn post_start_command(options: &ConfigOptions) -> String {
    let mut commands = vec![FIREWALL_INIT.to_string()];

    if let Some(name) = &options.git_user_name {
        commands.push(format!(
            "git config --global user.name {}",
            shell_words::quote(name)
        ));
    }
    if let Some(email) = &options.git_user_email {
        commands.push(format!(
            "git config --global user.email {}",
            shell_words::quote(email)
        ));
    }
    if let Some(key_id) = &options.gpg_key_id {
        commands.push(format!(
            "git config --global user.signingkey {}",
            shell_words::quote(key_id)
        ));
        commands.push("git config --global commit.gpgsign true".to_string());
        commands.push("git config --global gpg.program gpg".to_string());
        commands.push("gpg-connect-agent /bye >/dev/null 2>&1 || true".to_string());
    }
    if let Some(token) = &options.gh_token {
        commands.push(format!(
            "echo {} | gh auth login --with-token",
            shell_words::quote(token)
        ));
    }

    commands.join(" && ")
}

/// Writes `config` as pretty JSON to `<devcontainer_dir>/devcontainer.json`.
pub fn write_config(devcontainer_dir: &Path, config: &Value) -> Result<PathBuf, ConfigError> {
    let path = devcontainer_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json)
        .map_err(|source| ConfigError::io("writing devcontainer config", &path, source))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::post_start_command;
    use crate::options::ConfigOptions;

    fn segments(command: &str) -> Vec<Vec<String>> {
        command
            .split(" && ")
            .map(|segment| shell_words::split(segment).expect("segment should parse"))
            .collect()
    }

    #[test]
    fn firewall_runs_alone_without_git_settings() {
        let options = ConfigOptions::new("/p");
        assert_eq!(
            post_start_command(&options),
            "sudo /usr/local/bin/init-firewall.sh"
        );
    }

    #[test]
    fn git_identity_values_are_quoted() {
        let mut options = ConfigOptions::new("/p");
        options.git_user_name = Some("Ada O'Neil; rm -rf /".to_string());
        options.git_user_email = Some("ada@example.com".to_string());

        let parts = segments(&post_start_command(&options));

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[1],
            ["git", "config", "--global", "user.name", "Ada O'Neil; rm -rf /"]
        );
        assert_eq!(
            parts[2],
            ["git", "config", "--global", "user.email", "ada@example.com"]
        );
    }

    #[test]
    fn gpg_key_enables_signing() {
        let mut options = ConfigOptions::new("/p");
        options.gpg_key_id = Some("ABCD1234".to_string());

        let command = post_start_command(&options);

        assert!(command.starts_with("sudo /usr/local/bin/init-firewall.sh && "));
        assert!(command.contains("git config --global user.signingkey ABCD1234"));
        assert!(command.contains("git config --global commit.gpgsign true"));
        assert!(command.contains("git config --global gpg.program gpg"));
    }

    #[test]
    fn gh_token_is_piped_to_auth_login() {
        let mut options = ConfigOptions::new("/p");
        options.gh_token = Some("ghp_$(whoami)".to_string());

        let parts = segments(&post_start_command(&options));

        assert_eq!(
            parts.last().expect("token segment"),
            &["echo", "ghp_$(whoami)", "|", "gh", "auth", "login", "--with-token"]
        );
    }
}
