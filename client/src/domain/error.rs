//! Controller-level error types.
//!
//! Every failure a session can observe is non-fatal: the controller stays
//! usable and its cached state is unchanged. Presentation layers map the
//! [`ErrorCode`] to whatever notification they show.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ports::QuestServiceError;

/// Stable machine-readable error code describing the failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Fetching the user or the quest list during start-up failed.
    InitializationFailure,
    /// Refreshing the quest list failed.
    FetchFailure,
    /// Creating a quest failed, including local title validation.
    CreateFailure,
    /// Completing a quest failed, including "already completed" and "not found".
    CompleteFailure,
    /// Deleting a quest failed.
    DeleteFailure,
    /// Asking the service for the demo batch failed.
    DemoGenerationFailure,
    /// A completion for the same quest is already in flight.
    Conflict,
}

/// Controller error with an optional upstream cause.
///
/// # Examples
/// ```
/// use tidequest::domain::{Error, ErrorCode};
///
/// let err = Error::create_failure("quest title must not be empty");
/// assert_eq!(err.code(), ErrorCode::CreateFailure);
/// assert!(err.service_error().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: String,
    source: Option<QuestServiceError>,
}

impl Error {
    /// Create a new error without an upstream cause.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a quest service failure under `code`.
    pub fn from_service(code: ErrorCode, context: &str, source: QuestServiceError) -> Self {
        Self {
            code,
            message: format!("{context}: {source}"),
            source: Some(source),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message for notifications and logs.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// The quest service error behind this failure, if any.
    pub fn service_error(&self) -> Option<&QuestServiceError> {
        self.source.as_ref()
    }

    /// Convenience constructor for [`ErrorCode::CreateFailure`].
    pub fn create_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CreateFailure, message)
    }

    /// Convenience constructor for [`ErrorCode::CompleteFailure`].
    pub fn complete_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CompleteFailure, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests;
