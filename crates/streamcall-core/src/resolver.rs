//! Connection URL resolution.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::trace;
use url::Url;

use crate::error::{StreamError, StreamResult};
use crate::operation::{OperationKey, QueryParams};

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Produces the final connection address for an operation.
pub trait UrlResolver: Send + Sync + fmt::Debug {
    /// Resolve `operation` with `params` into a connection URL.
    fn resolve(&self, operation: &OperationKey, params: &QueryParams) -> StreamResult<Url>;
}

/// A validated base address with a WebSocket scheme and no trailing slash.
///
/// `http` and `https` inputs are mapped to `ws` and `wss`. The value is
/// immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAddress {
    root: String,
}

impl BaseAddress {
    /// Parse and normalize a base address.
    pub fn parse(input: &str) -> StreamResult<Self> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(StreamError::Configuration(
                "Base address must not be empty".to_string(),
            ));
        }

        let mut url = Url::parse(trimmed)?;
        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(StreamError::Configuration(format!(
                    "Unsupported scheme '{other}' in base address '{trimmed}'"
                )));
            }
        };
        if url.host_str().is_none() {
            return Err(StreamError::Configuration(format!(
                "Base address '{trimmed}' has no host"
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(StreamError::Configuration(format!(
                "Base address '{trimmed}' must not carry a query or fragment"
            )));
        }

        url.set_scheme(scheme).map_err(|()| {
            StreamError::Configuration(format!(
                "Cannot use scheme '{scheme}' for base address '{trimmed}'"
            ))
        })?;
        Ok(Self {
            root: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// The normalized address, e.g. `ws://localhost:9779/api`.
    pub fn as_str(&self) -> &str {
        &self.root
    }
}

impl fmt::Display for BaseAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}

/// Joins a [`BaseAddress`] with a rendered operation path and form-style
/// query parameters.
#[derive(Debug, Clone)]
pub struct DefaultUrlResolver {
    base: BaseAddress,
}

impl DefaultUrlResolver {
    /// Create a resolver for `base`.
    pub const fn new(base: BaseAddress) -> Self {
        Self { base }
    }

    /// The base address this resolver joins against.
    pub const fn base(&self) -> &BaseAddress {
        &self.base
    }
}

impl UrlResolver for DefaultUrlResolver {
    fn resolve(&self, operation: &OperationKey, params: &QueryParams) -> StreamResult<Url> {
        let path = operation
            .render_path(|value| utf8_percent_encode(value, PATH_SEGMENT).to_string())?;
        let mut url = Url::parse(&format!("{}{path}", self.base.as_str()))?;

        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.pairs() {
                query.append_pair(key, &value);
            }
        }

        trace!(operation = operation.name(), url = %url, "Resolved streaming URL");
        Ok(url)
    }
}
