//! Frames, connection events and connection state.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// One inbound message. Each frame is one logical stream item; frames are
/// never reassembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Bytes),
}

impl Frame {
    /// Raw payload bytes regardless of frame kind.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Close code and reason sent by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    /// Close status code.
    pub code: u16,
    /// Close reason, possibly empty.
    pub reason: String,
}

impl CloseInfo {
    /// Normal closure status code.
    pub const NORMAL: u16 = 1000;

    /// Create close information.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Returns `true` for a normal (1000) closure.
    pub const fn is_normal(&self) -> bool {
        self.code == Self::NORMAL
    }
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}

/// Event delivered by a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A message arrived.
    Frame(Frame),
    /// The peer closed the connection. No further frames follow.
    Closed(Option<CloseInfo>),
    /// The transport failed after the connection was open.
    Failed(StreamError),
}

/// Lifecycle state of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// The socket is being opened.
    Connecting,
    /// The socket is open and frames may arrive.
    Open,
    /// Closure has started.
    Closing,
    /// The socket is released. Terminal.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes() {
        let text = Frame::from("{\"a\":1}");
        assert_eq!(text.as_bytes(), b"{\"a\":1}");
        assert_eq!(text.len(), 7);

        let binary = Frame::Binary(Bytes::from_static(b"42"));
        assert_eq!(binary.as_bytes(), b"42");
        assert!(!binary.is_empty());
    }

    #[test]
    fn test_close_info_display() {
        assert_eq!(CloseInfo::new(1000, "").to_string(), "1000");
        assert_eq!(
            CloseInfo::new(1011, "internal error").to_string(),
            "1011 (internal error)"
        );
        assert!(CloseInfo::new(1000, "bye").is_normal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
