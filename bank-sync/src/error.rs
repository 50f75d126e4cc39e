//! Error types for bank sync

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bank sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Bank sync errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error (connect, timeout, body decoding)
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from an external API
    #[error("{service} API error {status}: {body}")]
    Api {
        /// Which API answered
        service: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Retry budget spent on a retryable failure
    #[error("Retry exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// Attempts made
        attempts: u32,
        /// Last error seen
        last_error: String,
    },

    /// No destination bank integration for the configured provider
    #[error("No bank integration found for provider: {0}")]
    RouteNotFound(String),

    /// Destination rejected or never acknowledged a transaction
    #[error("Failed to post transaction {transaction_id} from account {account}: {source}")]
    Post {
        /// Source account display name
        account: String,
        /// Source transaction ID
        transaction_id: String,
        /// Underlying failure
        source: Box<Error>,
    },

    /// Ledger snapshot exists but cannot be read back
    #[error("Ledger snapshot {} is corrupt: {reason}", path.display())]
    LedgerCorrupt {
        /// Snapshot path
        path: PathBuf,
        /// Parse failure
        reason: String,
    },

    /// Ledger snapshot could not be written
    #[error("Failed to persist ledger to {}: {reason}", path.display())]
    Persist {
        /// Snapshot path
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },
}

impl Error {
    /// Whether the transport should try the request again.
    ///
    /// Network failures, 429 and 5xx are transient; any other 4xx is a
    /// rejection of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            service: "test",
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(api(500).is_retryable());
        assert!(api(503).is_retryable());
        assert!(api(429).is_retryable());
    }

    #[test]
    fn test_client_errors_are_terminal() {
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!api(422).is_retryable());
    }

    #[test]
    fn test_local_errors_are_terminal() {
        assert!(!Error::Config("missing key".to_string()).is_retryable());
        assert!(!Error::RouteNotFound("Mercury".to_string()).is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            service: "InvoiceNinja",
            status: 422,
            body: "invalid date".to_string(),
        };
        assert_eq!(err.to_string(), "InvoiceNinja API error 422: invalid date");
    }
}
