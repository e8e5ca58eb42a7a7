//! CLI error types

use streamcall_client::StreamError;
use thiserror::Error;

/// CLI result alias
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the `streamcall` binary
#[derive(Error, Debug)]
pub enum CliError {
    /// The stream ended with an error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Hints printed below the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Stream(StreamError::Connection { .. }) => vec![
                "Check that the engine is running",
                "Verify the address passed with --url or STREAMCALL_URL",
            ],
            Self::Stream(StreamError::Rejected { .. }) => vec![
                "Verify the enclave, service or execution identifier",
                "Check that --url points at the engine's API port",
            ],
            Self::Stream(StreamError::Configuration(_)) | Self::InvalidArguments(_) => {
                vec!["Use --help to see expected arguments"]
            }
            Self::Stream(StreamError::Decode { .. }) => {
                vec!["Pass --skip-malformed to ignore frames that fail to decode"]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_has_suggestions() {
        let err = CliError::from(StreamError::connection("localhost", "refused"));
        assert_eq!(
            err.to_string(),
            "Stream error: Connection to localhost failed: refused"
        );
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_rejected_upgrade_has_suggestions() {
        let err = CliError::from(StreamError::rejected("localhost", 404, b"not found"));
        assert_eq!(
            err.to_string(),
            "Stream error: Connection to localhost rejected with HTTP 404: not found"
        );
        assert_eq!(err.suggestions().len(), 2);
    }

    #[test]
    fn test_cancelled_has_no_suggestions() {
        assert!(CliError::from(StreamError::Cancelled).suggestions().is_empty());
    }
}
