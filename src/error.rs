//! Error types for the template preview library

use std::process::ExitStatus;
use thiserror::Error;

use crate::store::TemplateId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code used when an identifier is malformed or unknown (`-1` as a byte)
pub const EXIT_BAD_IDENTIFIER: i32 = 255;

/// Main error type for the template preview library
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier is not a 24-digit hexadecimal ObjectId
    #[error("Template ID is invalid: {0}")]
    InvalidIdentifierFormat(String),

    /// Identifier is well formed but absent from the store
    #[error("Template ID does not exist in database: {0}")]
    RecordNotFound(TemplateId),

    /// The template store could not be opened or read
    #[error("Template store unavailable ({location}): {reason}")]
    StoreUnavailable { location: String, reason: String },

    /// The external compiler ran but exited unsuccessfully
    #[error("{program} failed: {status}")]
    CompilationFailure { program: String, status: String },

    /// The external compiler could not be started
    #[error("Could not run {program}: {source}")]
    CompilerUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Mustache template could not be parsed
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration file or section problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Directory traversal error while staging assets
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Build a `CompilationFailure` from a finished process status
    pub fn compilation(program: &str, status: ExitStatus) -> Self {
        Error::CompilationFailure {
            program: program.to_string(),
            status: status.to_string(),
        }
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidIdentifierFormat(_) | Error::RecordNotFound(_) => EXIT_BAD_IDENTIFIER,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_errors_exit_255() {
        let err = Error::InvalidIdentifierFormat("nope".to_string());
        assert_eq!(err.exit_code(), 255);

        let id: TemplateId = "5c9b7f3e2a1d4e0012345678".parse().unwrap();
        let err = Error::RecordNotFound(id);
        assert_eq!(err.exit_code(), 255);
        assert!(err.to_string().contains("5c9b7f3e2a1d4e0012345678"));
    }

    #[test]
    fn test_other_errors_exit_1() {
        let err = Error::Config("missing store".to_string());
        assert_eq!(err.exit_code(), 1);

        let err = Error::CompilationFailure {
            program: "xelatex".to_string(),
            status: "exit status: 1".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "xelatex failed: exit status: 1");
    }
}
