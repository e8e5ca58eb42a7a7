//! Stream error types.

use thiserror::Error;

/// A specialized `Result` type for streaming operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// One element of a response stream: a decoded value or the terminal error
/// that ended the stream.
pub type StreamItem<T> = StreamResult<T>;

/// Number of payload bytes kept in a [`StreamError::Decode`] preview.
const PAYLOAD_PREVIEW_LEN: usize = 128;

/// Errors that end a streaming operation.
///
/// Every variant is terminal for the stream that produced it. None of them is
/// retried automatically; a caller recovers by starting a new stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamError {
    /// The connection never reached the open state.
    #[error("Connection to {host} failed: {reason}")]
    Connection {
        /// Host (or raw address when no host could be parsed) that was dialed.
        host: String,
        /// The underlying cause reported by the transport.
        reason: String,
    },

    /// The peer answered the upgrade request with a plain HTTP response.
    #[error("Connection to {host} rejected with HTTP {status}: {body}")]
    Rejected {
        /// Host that was dialed.
        host: String,
        /// HTTP status code of the response.
        status: u16,
        /// Response body, lossily converted to text. Empty when none was sent.
        body: String,
    },

    /// An established connection failed before the peer closed it.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// An inbound frame could not be decoded into the expected shape.
    #[error("Decode failed: {reason} (payload: {payload_preview:?})")]
    Decode {
        /// What the decoder rejected.
        reason: String,
        /// The leading bytes of the offending frame, lossily converted to text.
        payload_preview: String,
    },

    /// The peer reported a failure on the stream itself.
    #[error("Server error [{code}]: {message}")]
    Server {
        /// Status code sent by the peer.
        code: u32,
        /// Human readable message sent by the peer.
        message: String,
    },

    /// The caller cancelled the stream and asked for cancellation to be
    /// reported as an error.
    #[error("Stream cancelled")]
    Cancelled,

    /// The client or request was configured with invalid parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StreamError {
    /// Build a [`StreamError::Connection`] for the given host.
    pub fn connection(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`StreamError::Rejected`] from an HTTP response to the upgrade request.
    pub fn rejected(host: impl Into<String>, status: u16, body: &[u8]) -> Self {
        Self::Rejected {
            host: host.into(),
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Build a [`StreamError::Decode`] keeping a short preview of `payload`.
    pub fn decode(reason: impl ToString, payload: &[u8]) -> Self {
        let end = payload.len().min(PAYLOAD_PREVIEW_LEN);
        Self::Decode {
            reason: reason.to_string(),
            payload_preview: String::from_utf8_lossy(&payload[..end]).into_owned(),
        }
    }

    /// Returns `true` for decode failures, the only kind a skip policy may pass over.
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<url::ParseError> for StreamError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("Invalid address: {err}"))
    }
}
