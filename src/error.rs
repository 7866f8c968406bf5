//! Error types for the recommender driver
//!
//! Every user or configuration error is an anticipated abort: the message is
//! shown on stderr and the process exits with [`ABORT_EXIT_CODE`].

use std::path::PathBuf;
use thiserror::Error;

use crate::cli::validate::ValidationRule;

/// Exit status for every abort (the platform equivalent of `-1`)
pub const ABORT_EXIT_CODE: u8 = 255;

/// Main error type for the driver
#[derive(Error, Debug)]
pub enum DriverError {
    /// Option processing rejected a flag or its value
    #[error("{message}")]
    Options { message: String },

    /// A cross-field validation rule failed
    #[error("{message}")]
    Validation {
        rule: ValidationRule,
        message: String,
    },

    /// A positional argument was left over after option processing
    #[error("unexpected argument '{argument}'")]
    UnexpectedArgument { argument: String, usage: String },

    /// Recommender selection or configuration failed
    #[error("Recommender error: {message}")]
    Recommender {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// ID mapping errors
    #[error("Mapping error: {message}")]
    Mapping {
        message: String,
        path: Option<PathBuf>,
    },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Iteration search errors
    #[error("Search error: {message}")]
    Search { message: String },

    /// Process hook installation errors
    #[error("Hook error: {message}")]
    Hook {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DriverError {
    /// Create a new option processing error
    pub fn options(message: impl Into<String>) -> Self {
        Self::Options {
            message: message.into(),
        }
    }

    /// Create a new validation error for the given rule
    pub fn validation(rule: ValidationRule, message: impl Into<String>) -> Self {
        Self::Validation {
            rule,
            message: message.into(),
        }
    }

    /// Create a new leftover-argument error carrying the rendered usage
    pub fn unexpected_argument(argument: impl Into<String>, usage: impl Into<String>) -> Self {
        Self::UnexpectedArgument {
            argument: argument.into(),
            usage: usage.into(),
        }
    }

    /// Create a new recommender error
    pub fn recommender(message: impl Into<String>) -> Self {
        Self::Recommender {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new mapping error, optionally tied to a file
    pub fn mapping(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Mapping {
            message: message.into(),
            path,
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new search error
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Create a new hook installation error
    pub fn hook(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Hook {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The validation rule that failed, if this is a validation error
    pub fn rule(&self) -> Option<ValidationRule> {
        match self {
            Self::Validation { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// Process exit status for this error
    pub const fn exit_code(&self) -> u8 {
        ABORT_EXIT_CODE
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_exposes_rule() {
        let err = DriverError::validation(ValidationRule::SingleFold, "bad folds");
        assert_eq!(err.rule(), Some(ValidationRule::SingleFold));
        assert_eq!(err.to_string(), "bad folds");
        assert_eq!(err.exit_code(), ABORT_EXIT_CODE);
    }

    #[test]
    fn test_unexpected_argument_names_token() {
        let err = DriverError::unexpected_argument("foo", "Usage: rec-driver");
        assert_eq!(err.to_string(), "unexpected argument 'foo'");
        assert!(err.rule().is_none());
    }
}
