//! # streamcall WebSocket connector
//!
//! [`Connector`](streamcall_core::Connector) implementation over
//! `tokio-tungstenite`. Each call opens a fresh socket; a single background
//! reader task per socket pushes frames into a bounded queue that the
//! consumer pulls from.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use streamcall_core::{Connection, ConnectionEvent, Connector};
//! use streamcall_websocket::{WebSocketConfig, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new(WebSocketConfig::new().with_queue_capacity(16));
//! let url = "ws://localhost:9779/enclaves/test/logs".parse()?;
//! let mut connection = connector.connect(&url).await?;
//! while let ConnectionEvent::Frame(frame) = connection.recv().await {
//!     println!("{} bytes", frame.len());
//! }
//! connection.close();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! streamcall-websocket/
//! ├── config.rs      # Connector configuration and builders
//! ├── connector.rs   # Handshake and error mapping
//! ├── connection.rs  # Connection trait implementation
//! └── tasks.rs       # Background reader task
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod config;
mod connection;
mod connector;
mod tasks;

pub use config::{
    DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_QUEUE_CAPACITY, WebSocketConfig,
};
pub use connection::WebSocketConnection;
pub use connector::WebSocketConnector;
