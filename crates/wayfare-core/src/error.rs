//! Error types for the wayfare client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, API, authentication, storage and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for wayfare operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-success status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication errors (bad credentials, failed refresh, exhausted replay).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Token store failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (URL, header, body, configuration).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A response body did not have the expected shape.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

impl Error {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status),
            Error::Auth(AuthError::ReplayExhausted(err)) => Some(err.status),
            Error::Auth(AuthError::Refresh(RefreshError::Rejected { status, .. })) => Some(*status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Error code from the body (if present).
    pub error: Option<String>,
    /// Error message from the body (if present).
    pub message: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check if this response means the access token was not accepted.
    ///
    /// 401 always qualifies. 403 qualifies when `forbidden_is_expiry` is set,
    /// since the backend answers expired tokens with either status.
    pub fn is_auth_failure(&self, forbidden_is_expiry: bool) -> bool {
        self.status == 401 || (forbidden_is_expiry && self.status == 403)
    }
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The login endpoint rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An operation needed a stored session and there was none.
    #[error("not logged in")]
    NotLoggedIn,

    /// A request replayed after a successful refresh was still rejected.
    #[error("request rejected after token refresh: {0}")]
    ReplayExhausted(ApiError),

    /// The access token could not be refreshed.
    #[error("token refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

/// Why a token refresh failed.
///
/// Cloneable so that every caller waiting on the same refresh receives
/// the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh token is stored. Expected after logout or on a fresh install.
    #[error("no refresh token")]
    NoRefreshToken,

    /// The refresh endpoint rejected the refresh token.
    #[error("refresh rejected with HTTP {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// The refresh endpoint answered 2xx without an access token.
    #[error("no access token in refresh response")]
    MissingAccessToken,

    /// The refresh call did not complete (connection, timeout).
    #[error("refresh transport failure: {message}")]
    Transport { message: String },

    /// The refresh task stopped before producing an outcome.
    #[error("refresh aborted: {message}")]
    Aborted { message: String },
}

impl RefreshError {
    /// True when the failure is part of normal operation rather than a fault.
    pub fn is_expected(&self) -> bool {
        matches!(self, RefreshError::NoRefreshToken)
    }
}

/// Token store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned or unavailable.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Request body could not be serialized.
    #[error("invalid request body: {reason}")]
    Body { reason: String },

    /// Missing or malformed configuration value.
    #[error("invalid configuration '{key}': {reason}")]
    Config { key: String, reason: String },
}
