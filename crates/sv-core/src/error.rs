//! # AppError
//!
//! Centralized error handling for the Snipvote ecosystem.
//! Maps domain-specific failures to actionable error types.

use crate::models::LintError;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for all sv-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Suggestion)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed request body or missing required fields
    #[error("validation error: {0}")]
    Validation(String),

    /// Submitted code failed to parse
    #[error("snippet failed to parse ({} errors)", .0.len())]
    BadCode(Vec<LintError>),

    /// Action requires a resolvable identity and none exists
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Second vote or suggestion from the same client for the same post.
    /// Benign under the first-write-wins policy: callers answer with a
    /// no-op, never a 5xx.
    #[error("duplicate {0} for this client and post")]
    DuplicateAction(&'static str),

    /// Operation refused while other rows reference the target
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded
    #[error("too many requests, retry in {}s", .0.as_secs().max(1))]
    RateLimited(Duration),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Snipvote logic.
pub type Result<T> = std::result::Result<T, AppError>;
