//! The command run inside the container once it is up.

pub const ASSISTANT_PROGRAM: &str = "claude";
pub const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantCommand {
    /// `bash -c <script>`, for poking at the container.
    Shell(String),
    /// The assistant itself. Permission prompts are skipped unless `safe_mode`.
    Assistant { safe_mode: bool, args: Vec<String> },
}

impl AssistantCommand {
    /// `--shell` wins over everything; trailing arguments only reach the assistant.
    #[must_use]
    pub fn from_flags(shell: Option<String>, safe_mode: bool, args: Vec<String>) -> Self {
        match shell {
            Some(script) => {
                if !args.is_empty() {
                    tracing::debug!(?args, "ignoring assistant arguments with --shell");
                }
                Self::Shell(script)
            }
            None => Self::Assistant { safe_mode, args },
        }
    }

    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Shell(script) => vec!["bash".to_string(), "-c".to_string(), script.clone()],
            Self::Assistant { safe_mode, args } => {
                let mut argv = vec![ASSISTANT_PROGRAM.to_string()];
                if !safe_mode {
                    argv.push(SKIP_PERMISSIONS_FLAG.to_string());
                }
                argv.extend(args.iter().cloned());
                argv
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::AssistantCommand;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn default_skips_permission_prompts() {
        let command = AssistantCommand::from_flags(None, false, strings(&["--resume"]));
        assert_eq!(
            command.argv(),
            strings(&["claude", "--dangerously-skip-permissions", "--resume"])
        );
    }

    #[test]
    fn safe_mode_keeps_permission_prompts() {
        let command = AssistantCommand::from_flags(None, true, strings(&["fix", "tests"]));
        assert_eq!(command.argv(), strings(&["claude", "fix", "tests"]));
    }

    #[test]
    fn shell_runs_script_under_bash() {
        let command =
            AssistantCommand::from_flags(Some("echo hi".to_string()), true, strings(&["ignored"]));
        assert_eq!(command.argv(), strings(&["bash", "-c", "echo hi"]));
    }
}
