//! # streamcall client
//!
//! Cancellable streaming client for long-lived API operations. Each call
//! opens one WebSocket and returns a [`ResponseStream`]: a lazily pulled,
//! typed sequence of decoded frames that releases its connection exactly
//! once, however it ends.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use streamcall_client::engine::{LogFrame, ServiceLogsRequest};
//! use streamcall_client::{CancellationToken, ClientConfig, StreamClient};
//!
//! let client = StreamClient::new(ClientConfig::new("http://localhost:9779"))?;
//! let token = CancellationToken::new();
//! let request = ServiceLogsRequest::new(["a1b2c3"]).with_follow_logs(true);
//!
//! let mut logs = client.enclave_logs("my-enclave", &request, Some(token.clone()));
//! while let Some(item) = logs.next().await {
//!     if let LogFrame::Data(batch) = item? {
//!         for (service, lines) in batch.service_logs_by_service_uuid {
//!             println!("{service}: {:?}", lines.line);
//!         }
//!     }
//! }
//! ```
//!
//! ## Termination
//!
//! A stream ends when the peer closes the socket, when the caller's
//! [`CancellationToken`] fires, or after a terminal error item. Cancellation
//! is silent unless [`CancellationPolicy::Error`] is configured. Malformed
//! frames end the stream unless [`DecodePolicy::Skip`] is configured.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cancellation;
mod client;
mod config;
pub mod engine;
mod handle;
mod stream;

pub use cancellation::{Subscription, subscribe};
pub use client::{RequestOptions, StreamClient, StreamClientBuilder};
pub use config::ClientConfig;
pub use handle::{CloseCause, ConnectionHandle, ConnectionStats, Delivery};
pub use stream::ResponseStream;

pub use streamcall_core::{
    BaseAddress, CancellationPolicy, CancellationToken, CloseInfo, Connection, ConnectionEvent,
    ConnectionState, Connector, DecodePolicy, Decoder, DefaultUrlResolver, Frame, JsonDecoder,
    OperationKey, ParamValue, QueryParams, StreamConfig, StreamError, StreamItem, StreamResult,
    UrlResolver, decoder_fn,
};
pub use streamcall_websocket::{WebSocketConfig, WebSocketConnector};
