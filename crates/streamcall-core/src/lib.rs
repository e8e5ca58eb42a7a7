//! # streamcall core
//!
//! Foundational types shared by every streamcall crate. Transport
//! implementations depend on this crate and implement [`Connector`] and
//! [`Connection`]; the client crate builds its streaming iterator on top of
//! them.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Traits**: [`Connector`], [`Connection`], [`Decoder`], [`UrlResolver`]
//! - **Types**: [`Frame`], [`ConnectionEvent`], [`ConnectionState`], [`CloseInfo`], [`OperationKey`], [`QueryParams`]
//! - **Errors**: [`StreamError`], [`StreamResult`], [`StreamItem`]
//! - **Config**: [`StreamConfig`], [`DecodePolicy`], [`CancellationPolicy`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use streamcall_core::{BaseAddress, DefaultUrlResolver, OperationKey, QueryParams, UrlResolver};
//!
//! let resolver = DefaultUrlResolver::new(BaseAddress::parse("http://localhost:9779/")?);
//! let operation = OperationKey::new("enclave_logs", "/enclaves/{enclave_identifier}/logs")
//!     .with_path_param("enclave_identifier", "my-enclave");
//! let url = resolver.resolve(&operation, &QueryParams::new().with("follow_logs", true))?;
//! assert_eq!(url.as_str(), "ws://localhost:9779/enclaves/my-enclave/logs?follow_logs=true");
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod config;
mod decoder;
mod error;
mod frame;
mod operation;
mod resolver;
mod traits;

pub use config::{CancellationPolicy, DecodePolicy, StreamConfig};
pub use decoder::{Decoder, FnDecoder, JsonDecoder, decoder_fn};
pub use error::{StreamError, StreamItem, StreamResult};
pub use frame::{CloseInfo, ConnectionEvent, ConnectionState, Frame};
pub use operation::{OperationKey, ParamValue, QueryParams, Scalar};
pub use resolver::{BaseAddress, DefaultUrlResolver, UrlResolver};
pub use traits::{Connection, Connector};

// Re-export the cancellation primitive so callers need not depend on tokio-util directly
pub use tokio_util::sync::CancellationToken;
