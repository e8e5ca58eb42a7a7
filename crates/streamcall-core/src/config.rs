//! Stream policy configuration.

use serde::{Deserialize, Serialize};

/// What a stream does when a frame fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Yield the decode error as the final item and close the stream.
    #[default]
    FailFast,
    /// Log the malformed frame and keep streaming.
    Skip,
}

/// How cancellation through the caller's token is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// End the stream without a trailing item.
    #[default]
    Silent,
    /// End the stream with a trailing [`StreamError::Cancelled`](crate::StreamError::Cancelled).
    Error,
}

/// Per-client stream behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreamConfig {
    /// Decode failure handling.
    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Cancellation reporting.
    #[serde(default)]
    pub cancellation_policy: CancellationPolicy,
}

impl StreamConfig {
    /// Create a configuration with default policies.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decode_policy: DecodePolicy::FailFast,
            cancellation_policy: CancellationPolicy::Silent,
        }
    }

    /// Lenient configuration: skip malformed frames, stay silent on cancel.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            decode_policy: DecodePolicy::Skip,
            cancellation_policy: CancellationPolicy::Silent,
        }
    }

    /// Set the decode policy
    pub const fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    /// Set the cancellation policy
    pub const fn with_cancellation_policy(mut self, policy: CancellationPolicy) -> Self {
        self.cancellation_policy = policy;
        self
    }
}
