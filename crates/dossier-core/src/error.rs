use thiserror::Error;

/// Application-wide error types for dossier.
#[derive(Error, Debug)]
pub enum AppError {
    /// The element reference went stale after a DOM re-render.
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// A wait on the remote UI expired before its condition held.
    #[error("Wait timed out after {0} ms")]
    WaitTimeout(u64),

    /// The locator matched nothing and the session reported a hard miss.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The retry budget was spent on transient failures.
    #[error("{reason}: gave up after {attempts} attempts ({source})")]
    RetryExhausted {
        reason: String,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    /// The automation session itself failed (CDP transport, navigation, script).
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Neither the cookie jar nor the interactive login produced a session.
    #[error("Authentication failed for {identity}: {message}")]
    AuthenticationFailed { identity: String, message: String },

    /// A profile record violated one of its invariants.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// HTTP request failed (industry classifier endpoint).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// LLM API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying locally.
    ///
    /// Only stale references and expired waits qualify; a hard "not found"
    /// propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::StaleElement(_) | AppError::WaitTimeout(_))
    }

    /// Returns true if the error must abort profile assembly instead of
    /// degrading to a partially-empty record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::AuthenticationFailed { .. } | AppError::Cancelled
        )
    }

    /// Wraps `self` as the final cause of an exhausted retry loop.
    pub fn exhausted(self, reason: &str, attempts: u32) -> Self {
        AppError::RetryExhausted {
            reason: reason.to_string(),
            attempts,
            source: Box::new(self),
        }
    }
}
