//! Configuration for the WebSocket connector.

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as ProtocolConfig;

/// Default limit for a single inbound message (16MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default limit for a single inbound frame (4MB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Default number of events buffered between the socket reader and the stream.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for [`WebSocketConnector`](crate::WebSocketConnector).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Maximum message size (default: 16MB)
    pub max_message_size: usize,

    /// Maximum frame size (default: 4MB)
    pub max_frame_size: usize,

    /// Capacity of the queue between the reader task and the consumer
    pub queue_capacity: usize,

    /// `User-Agent` header sent with the upgrade request
    pub user_agent: Option<String>,

    /// Disable Nagle's algorithm on the underlying TCP socket
    pub disable_nagle: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            user_agent: Some(concat!("streamcall/", env!("CARGO_PKG_VERSION")).to_string()),
            disable_nagle: true,
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set maximum frame size
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the reader queue capacity. Zero is raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set or clear the `User-Agent` header
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Toggle `TCP_NODELAY`
    pub fn with_disable_nagle(mut self, disable: bool) -> Self {
        self.disable_nagle = disable;
        self
    }

    pub(crate) fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_frame_size))
    }
}
