//! Client configuration.

use serde::{Deserialize, Serialize};
use streamcall_core::{CancellationPolicy, DecodePolicy, StreamConfig};
use streamcall_websocket::WebSocketConfig;

/// Configuration for [`StreamClient`](crate::StreamClient).
///
/// ```rust,ignore
/// let config = ClientConfig::new("http://localhost:9779")
///     .with_decode_policy(DecodePolicy::Skip)
///     .with_queue_capacity(16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the API, `http(s)://` or `ws(s)://`.
    pub base_url: String,

    /// Stream policies.
    #[serde(default)]
    pub stream: StreamConfig,

    /// WebSocket transport settings.
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

impl ClientConfig {
    /// Create a configuration for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stream: StreamConfig::default(),
            websocket: WebSocketConfig::default(),
        }
    }

    /// Tolerant configuration for interactive tailing: malformed frames are
    /// skipped instead of ending the stream.
    pub fn tolerant(base_url: impl Into<String>) -> Self {
        Self::new(base_url).with_stream_config(StreamConfig::lenient())
    }

    /// Replace the stream policies
    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Set the decode policy
    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.stream.decode_policy = policy;
        self
    }

    /// Set the cancellation policy
    pub fn with_cancellation_policy(mut self, policy: CancellationPolicy) -> Self {
        self.stream.cancellation_policy = policy;
        self
    }

    /// Replace the WebSocket settings
    pub fn with_websocket_config(mut self, websocket: WebSocketConfig) -> Self {
        self.websocket = websocket;
        self
    }

    /// Set the reader queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.websocket = self.websocket.with_queue_capacity(capacity);
        self
    }

    /// Set the maximum inbound message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.websocket = self.websocket.with_max_message_size(size);
        self
    }

    /// Set or clear the `User-Agent` header
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.websocket = self.websocket.with_user_agent(user_agent);
        self
    }
}
