//! Error types for the Leave Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition a caller of the engine can observe. Notification
//! failures are deliberately absent: they never reach the caller.

use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the Leave Engine.
///
/// # Example
///
/// ```
/// use leave_engine::error::{EngineError, ErrorKind};
///
/// let error = EngineError::NotFound {
///     entity: "request",
///     id: "42".to_string(),
/// };
/// assert_eq!(error.to_string(), "request not found: 42");
/// assert_eq!(error.kind(), ErrorKind::NotFound);
/// ```
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A field was missing or invalid, or the date range was empty, inverted
    /// or overlapping another open request.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The chargeable days exceed what the period still has outstanding.
    #[error("Insufficient balance in period {period_id}: requested {requested}, outstanding {outstanding}")]
    InsufficientBalance {
        /// The period that would be overdrawn.
        period_id: String,
        /// Days requested.
        requested: Decimal,
        /// Days still available.
        outstanding: Decimal,
    },

    /// A request, period, approval, employee or token does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity looked up.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The actor lacks the role or level for the attempted operation.
    #[error("Employee {actor} is not allowed to {action}")]
    PermissionDenied {
        /// The acting employee.
        actor: String,
        /// The attempted operation.
        action: String,
    },

    /// The request cannot move from its current state with this action.
    #[error("Cannot {action} a request in state {state}")]
    InvalidTransition {
        /// The current state of the request.
        state: String,
        /// The attempted action.
        action: String,
    },

    /// The approval token is unknown, used, claimed, superseded or expired.
    #[error("Approval token is invalid or expired")]
    InvalidOrExpiredToken,

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The in-memory store could not be accessed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },
}

/// Fieldless classification of [`EngineError`], for callers that only need
/// to branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EngineError::Validation`].
    Validation,
    /// See [`EngineError::InsufficientBalance`].
    InsufficientBalance,
    /// See [`EngineError::NotFound`].
    NotFound,
    /// See [`EngineError::PermissionDenied`].
    PermissionDenied,
    /// See [`EngineError::InvalidTransition`].
    InvalidTransition,
    /// See [`EngineError::InvalidOrExpiredToken`].
    InvalidOrExpiredToken,
    /// Configuration could not be loaded.
    Config,
    /// See [`EngineError::Storage`].
    Storage,
}

impl EngineError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EngineError::InvalidOrExpiredToken => ErrorKind::InvalidOrExpiredToken,
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ErrorKind::Config
            }
            EngineError::Storage { .. } => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn denied(actor: impl ToString, action: impl Into<String>) -> Self {
        EngineError::PermissionDenied {
            actor: actor.to_string(),
            action: action.into(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        EngineError::Storage {
            message: "Lock poisoned".to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
