//! Error types for devhost-core.

use thiserror::Error;

/// Result type alias using devhost-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for devhost operations
#[derive(Error, Debug)]
pub enum Error {
    // Absence errors (reported verbatim in command results)
    #[error("No pid found")]
    NoPidFound,

    #[error("No base url found")]
    NoUrlFound,

    #[error("No child process found")]
    NoChildProcessFound,

    // Git errors
    #[error("Malformed git status line: {0}")]
    GitStatusParse(String),

    // Debugger errors
    #[error("Failed to launch debugger {program}: {reason}")]
    DebuggerSpawn { program: String, reason: String },

    #[error("Invalid debugger argument template: {0}")]
    ArgumentTemplate(String),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed: {0}")]
    HttpStatus(reqwest::StatusCode),

    // Scheduler errors
    #[error("Resource already registered: {0}")]
    DuplicateResource(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Command execution errors
    #[error("Command failed: {cmd}\n{stderr}")]
    CommandFailed { cmd: String, stderr: String },

    #[error("Operation cancelled")]
    Cancelled,

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a command failure
    pub fn command_failed(cmd: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            cmd: cmd.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_messages_are_stable() {
        assert_eq!(Error::NoPidFound.to_string(), "No pid found");
        assert_eq!(Error::NoUrlFound.to_string(), "No base url found");
        assert_eq!(
            Error::NoChildProcessFound.to_string(),
            "No child process found"
        );
    }

    #[test]
    fn test_command_failed() {
        let err = Error::command_failed("git fetch", "fatal: no remote");
        assert_eq!(err.to_string(), "Command failed: git fetch\nfatal: no remote");
    }
}
