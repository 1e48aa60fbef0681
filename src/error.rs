//! Error types for descriptor parsing, validation and data checks.
//!
//! Parsing is all-or-nothing: any structural problem rejects the whole
//! document with a [`DescriptorError`]. Invariant checks never fail this way;
//! they produce [`crate::validation::Violation`] lists instead, and each
//! violation maps back onto an [`ErrorKind`] of this taxonomy.
//!
//! ```
//! use ecodesc::error::{DescriptorError, ErrorKind};
//!
//! let err = ecodesc::parse("[Description]\nname = x\n").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MalformedDescriptor);
//! assert!(err.is_malformed());
//! ```
//!
//! The `ResultExt` trait adds `.context()` to any `Result` whose error
//! converts into a [`DescriptorError`]:
//!
//! ```no_run
//! use ecodesc::error::ResultExt as _;
//!
//! fn read(path: &str) -> ecodesc::error::Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read descriptor")
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for ecodesc operations.
#[derive(Debug)]
pub enum DescriptorError {
    /// Structural problem: missing section or key, bad line syntax.
    MalformedDescriptor {
        line: Option<usize>,
        message: String,
    },

    /// A numeric field (`min`, `max`, `step`) could not be used.
    InvalidFieldValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// A mapped column has no matching section or data column.
    UnresolvedColumnReference {
        role: Option<String>,
        column: String,
    },

    /// Subset or split expression could not be parsed
    InvalidQuery(String),

    /// I/O errors (descriptor or data file)
    Io(std::io::Error),

    /// CSV reader errors
    Csv(String),

    /// Settings file errors
    Config(String),

    /// Error wrapped with extra context
    Other(String),
}

/// The error taxonomy shared by parse errors and validation violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedDescriptor,
    InvalidFieldValue,
    UnresolvedColumnReference,
    InvalidQuery,
    Io,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MalformedDescriptor => "MalformedDescriptor",
            Self::InvalidFieldValue => "InvalidFieldValue",
            Self::UnresolvedColumnReference => "UnresolvedColumnReference",
            Self::InvalidQuery => "InvalidQuery",
            Self::Io => "Io",
            Self::Other => "Other",
        };
        f.write_str(s)
    }
}

impl DescriptorError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn malformed_at(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedDescriptor { .. } => ErrorKind::MalformedDescriptor,
            Self::InvalidFieldValue { .. } => ErrorKind::InvalidFieldValue,
            Self::UnresolvedColumnReference { .. } => ErrorKind::UnresolvedColumnReference,
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::Io(_) | Self::Csv(_) => ErrorKind::Io,
            Self::Config(_) | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// True when the document itself was rejected by the parser.
    ///
    /// A non-numeric bound makes the descriptor unusable just like a missing
    /// key does, so both kinds count.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedDescriptor | ErrorKind::InvalidFieldValue
        )
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDescriptor {
                line: Some(line),
                message,
            } => write!(f, "Malformed descriptor (line {line}): {message}"),
            Self::MalformedDescriptor {
                line: None,
                message,
            } => write!(f, "Malformed descriptor: {message}"),
            Self::InvalidFieldValue {
                section,
                key,
                value,
                reason,
            } => write!(
                f,
                "Invalid value '{value}' for '{key}' in [{section}]: {reason}"
            ),
            Self::UnresolvedColumnReference {
                role: Some(role),
                column,
            } => write!(f, "Unresolved column reference: {role} -> '{column}'"),
            Self::UnresolvedColumnReference { role: None, column } => {
                write!(f, "Unresolved column reference: '{column}'")
            }
            Self::InvalidQuery(msg) => write!(f, "Invalid query expression: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DescriptorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DescriptorError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for DescriptorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

/// Result type alias for ecodesc operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DescriptorError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: DescriptorError = e.into();
            DescriptorError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: DescriptorError = e.into();
            DescriptorError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DescriptorError::malformed_at(4, "missing ']' in section header");
        assert_eq!(
            err.to_string(),
            "Malformed descriptor (line 4): missing ']' in section header"
        );

        let err = DescriptorError::InvalidFieldValue {
            section: "row".to_owned(),
            key: "step".to_owned(),
            value: "one".to_owned(),
            reason: "not a number".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'one' for 'step' in [row]: not a number"
        );
    }

    #[test]
    fn test_malformed_classification() {
        assert!(DescriptorError::malformed("x").is_malformed());
        let invalid = DescriptorError::InvalidFieldValue {
            section: "row".to_owned(),
            key: "min".to_owned(),
            value: "low".to_owned(),
            reason: "not a number".to_owned(),
        };
        assert!(invalid.is_malformed());
        assert_eq!(invalid.kind(), ErrorKind::InvalidFieldValue);
        assert!(!DescriptorError::InvalidQuery("x".to_owned()).is_malformed());
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "ANBO.txt",
        ));

        let result: Result<()> = result.context("Failed to read descriptor");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read descriptor")
        );
    }
}
