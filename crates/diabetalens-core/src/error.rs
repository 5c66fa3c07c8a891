//! Error types for DiabetaLens Core
//!
//! Every stage of the pipeline reports failures through [`DiabetaError`].
//! Three variants form the domain taxonomy callers are expected to branch on
//! (`InvalidInput`, `InsufficientData`, `ClassifierUnavailable`); the rest are
//! ambient failures from configuration and model loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for DiabetaLens operations
pub type Result<T> = std::result::Result<T, DiabetaError>;

/// Main error type for DiabetaLens operations
#[derive(Error, Debug)]
pub enum DiabetaError {
    /// Age, BMI or step history outside the accepted domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every step value was discarded as an outlier
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The risk classifier could not be reached, timed out, or answered with garbage
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Inconsistent or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<DiabetaError>,
    },
}

/// Stable classification of a [`DiabetaError`], independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InsufficientData,
    ClassifierUnavailable,
    Config,
    Serialization,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::ClassifierUnavailable => "classifier_unavailable",
            ErrorKind::Config => "config",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
        };
        f.write_str(label)
    }
}

impl DiabetaError {
    /// Shorthand for an [`DiabetaError::InvalidInput`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Shorthand for a [`DiabetaError::ClassifierUnavailable`]
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(message.into())
    }

    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Taxonomy bucket of this error; context wrappers report their source's kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiabetaError::InvalidInput(_) => ErrorKind::InvalidInput,
            DiabetaError::InsufficientData(_) => ErrorKind::InsufficientData,
            DiabetaError::ClassifierUnavailable(_) => ErrorKind::ClassifierUnavailable,
            DiabetaError::Config(_) => ErrorKind::Config,
            DiabetaError::Serialization(_) => ErrorKind::Serialization,
            DiabetaError::Io(_) => ErrorKind::Io,
            DiabetaError::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = DiabetaError::invalid("age 130 outside [0, 120]");
        let err = err.context("Failed to compute baseline");

        assert!(err.to_string().contains("Failed to compute baseline"));
        assert!(err.to_string().contains("age 130"));
    }

    #[test]
    fn test_context_preserves_kind() {
        let err = DiabetaError::classifier("timed out").context("Risk level stage");
        assert_eq!(err.kind(), ErrorKind::ClassifierUnavailable);

        let nested = DiabetaError::InsufficientData("no valid days".into())
            .context("inner")
            .context("outer");
        assert_eq!(nested.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(DiabetaError::Config("low_max >= moderate_max".into()));
        let result = result.with_context(|| "Loading diabetalens.toml".to_string());

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("Loading diabetalens.toml"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::InsufficientData.to_string(), "insufficient_data");
        assert_eq!(
            serde_json::to_string(&ErrorKind::ClassifierUnavailable).unwrap(),
            "\"classifier_unavailable\""
        );
    }
}
