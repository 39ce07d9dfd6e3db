/// Structured error types for roster-store.
///
/// Uses `thiserror` so the server crate can match on `NotFound` while every
/// other failure stays opaque. Binary crates (roster-cli) wrap these in
/// `anyhow` at the edges.
use thiserror::Error;

/// Error returned by every [`DocumentStore`](crate::DocumentStore) operation
#[derive(Error, Debug)]
pub enum StoreError {
    /// Point lookup or update targeted a document that does not exist
    #[error("document '{id}' not found")]
    NotFound { id: String },

    /// The store answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Remote { status: u16, message: String },

    /// Request never produced a response (DNS, TLS, connection reset, ...)
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// Access token could not be minted or exchanged
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// Response body did not have the expected shape
    #[error("invalid response from store: {reason}")]
    InvalidResponse { reason: String },

    /// Settings missing or malformed
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for roster-store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a not-found error for a document id
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a remote error from a status code and message
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True when the failure is the "document does not exist" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
