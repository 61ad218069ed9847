use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Unreachable,
    Storage,
    Serialization,
    InvalidConfig,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Unreachable => "UNREACHABLE",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Unreachable | Self::Storage => ErrorSeverity::Transient,
            Self::NotFound
            | Self::Validation
            | Self::Serialization
            | Self::InvalidConfig
            | Self::Internal => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Unreachable | Self::Storage)
    }
}

/// Error carried in the model and shown by the shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::NotFound => "This webcam is no longer available.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Unreachable => {
                "No connection. Images will refresh once you are back online.".into()
            }
            ErrorKind::Storage => "Your changes could not be saved. Please try again.".into(),
            ErrorKind::Serialization | ErrorKind::InvalidConfig | ErrorKind::Internal => {
                "Something went wrong.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_passed_through() {
        let err = AppError::new(ErrorKind::Validation, "interval must be between 1 and 120");
        assert_eq!(err.user_facing_message(), "interval must be between 1 and 120");
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn storage_errors_are_transient() {
        let err = AppError::new(ErrorKind::Storage, "disk full").with_context("table", "favorites");
        let shown = UserFacingError::from(&err);
        assert!(shown.is_transient);
        assert!(shown.is_retryable);
        assert_eq!(err.context.get("table").map(String::as_str), Some("favorites"));
    }

    #[test]
    fn display_includes_code() {
        let err = AppError::new(ErrorKind::NotFound, "webcam xyz");
        assert_eq!(err.to_string(), "[NOT_FOUND] webcam xyz");
    }
}
