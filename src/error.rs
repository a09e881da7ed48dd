use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to allocate a pseudo-terminal: {0}")]
    OpenPty(#[source] io::Error),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to switch the terminal to raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("'{program}' failed during container startup ({})", describe_code(.code))]
    StartupFailed { program: String, code: Option<i32> },

    #[error("failed to reap '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
