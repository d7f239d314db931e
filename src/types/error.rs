//! Error types for the dashboard core
//!
//! `FetchError` covers everything that can go wrong while talking to the
//! full node. It is `Clone` because a single refresh result is handed to
//! every caller waiting on it.

/// Failure to obtain a usable answer from the full node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The node answered with an error string
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered with neither a result nor an error
    #[error("no response from full node for {0}")]
    NoResponse(String),

    /// The HTTP request itself failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The node answered with a non-success HTTP status
    #[error("HTTP status {0} from full node")]
    HttpStatus(u16),

    /// The response could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Main error type for dashboard operations
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The chain rejected the key as structurally invalid. Not worth retrying.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ValidatorError {
    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Database(_))
    }
}

impl From<mongodb::error::Error> for ValidatorError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::oid::Error> for ValidatorError {
    fn from(err: bson::oid::Error) -> Self {
        Self::Database(format!("invalid object id: {}", err))
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, ValidatorError>;
