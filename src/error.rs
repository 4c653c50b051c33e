//! Unified error handling for the command bus.
//!
//! Every failure that travels up through the pipeline and out of
//! [`CommandBus::execute`](crate::bus::CommandBus::execute) is a [`BusError`].
//! Business-level failures a handler chooses to *report* are not errors at
//! all; they come back as [`CommandResult::Fail`](crate::command::CommandResult).

use crate::db::DbError;
use thiserror::Error;

// ============================================================================
// Bus Errors (propagated, never converted to a result by the core)
// ============================================================================

/// Errors that can escape the command pipeline.
#[derive(Debug, Error)]
pub enum BusError {
    /// No handler is registered under the requested name.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// The caller is not allowed to run the command.
    #[error("permission denied for command {command}")]
    PermissionDenied {
        command: String,
        user_id: Option<String>,
    },

    /// The command is still cooling down.
    #[error("command {command} is rate limited, try again in {retry_after_ms}ms")]
    RateLimited { command: String, retry_after_ms: u64 },

    /// Opaque failure raised by a business handler.
    #[error("handler failure: {0:#}")]
    Handler(anyhow::Error),

    /// A middleware invoked its continuation more than once.
    #[error("next() called multiple times")]
    PipelineMisuse,

    /// Backing repository fault (permission, cooldown, or audit state).
    #[error("repository failure: {0}")]
    Repository(#[from] DbError),
}

/// Discriminant of [`BusError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CommandNotFound,
    PermissionDenied,
    RateLimited,
    HandlerFailure,
    PipelineMisuse,
    RepositoryFailure,
}

impl BusError {
    /// Wrap any error raised by a business handler.
    pub fn handler(err: impl Into<anyhow::Error>) -> Self {
        Self::Handler(err.into())
    }

    /// Get the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CommandNotFound(_) => ErrorKind::CommandNotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Handler(_) => ErrorKind::HandlerFailure,
            Self::PipelineMisuse => ErrorKind::PipelineMisuse,
            Self::Repository(_) => ErrorKind::RepositoryFailure,
        }
    }

    /// Get a static error code string for metrics labeling and transport replies.
    #[inline]
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl ErrorKind {
    /// Stable wire/metrics code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            Self::CommandNotFound => "COMMAND_NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::RateLimited => "RATE_LIMITED",
            Self::HandlerFailure => "HANDLER_FAILURE",
            Self::PipelineMisuse => "PIPELINE_MISUSE",
            Self::RepositoryFailure => "REPOSITORY_FAILURE",
        }
    }
}

impl From<anyhow::Error> for BusError {
    fn from(err: anyhow::Error) -> Self {
        Self::Handler(err)
    }
}

/// Result type for everything that runs inside the pipeline.
pub type BusResult<T> = Result<T, BusError>;
