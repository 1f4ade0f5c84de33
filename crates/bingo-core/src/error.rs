//! # AppError
//!
//! Centralized error handling for the Streamer Bingo ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all bingo-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Page, Mode, Option Group)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty page slug)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller may not manage the requested page
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., document store unreachable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Edit rejected because it would leave the page unusable,
    /// or a resource already exists (e.g., duplicate page slug)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for Streamer Bingo logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by an `IdentityProvider`.
///
/// Callers surface every variant as the same generic message; the variants
/// exist for logging and tests.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("an account with this username already exists")]
    UsernameTaken,

    #[error("session is missing or expired")]
    InvalidSession,

    #[error("password reset token is invalid")]
    InvalidResetToken,

    #[error("identity backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}
