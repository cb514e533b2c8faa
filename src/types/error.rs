use thiserror::Error;

/// milktrack error types
#[derive(Error, Debug)]
pub enum MilktrackError {
    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("http error: {0}")]
    Http(String),

    /// Backend answered with a non-success status
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token missing, expired or rejected (401)
    #[error("session expired or invalid, please log in again")]
    Unauthorized,

    /// Backend refused the operation (403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Requested resource does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Form input rejected before sending
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation needs a signed-in session
    #[error("not signed in, run `milktrack login` first")]
    NotSignedIn,

    /// Current role lacks the capability for this operation
    #[error("permission denied: {0}")]
    Permission(String),

    /// Failed to parse JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Session store operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl MilktrackError {
    /// Whether the backend rejected the session itself (401/403)
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden(_))
    }
}

/// Result type alias for milktrack
pub type Result<T> = std::result::Result<T, MilktrackError>;
