//! Payloads of the engine log streams.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use streamcall_core::{Decoder, Frame, StreamError, StreamResult};

/// A batch of log lines grouped by service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLogs {
    /// Log lines keyed by service UUID, oldest first.
    #[serde(default)]
    pub service_logs_by_service_uuid: BTreeMap<String, LogLine>,

    /// Requested service UUIDs that have no logs.
    #[serde(default)]
    pub not_found_service_uuid_set: Vec<String>,
}

/// Log output of one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Line contents.
    #[serde(default)]
    pub line: Vec<String>,

    /// Timestamp of the last line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// How a filter matches a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLineOperator {
    /// Line contains the text.
    DoesContainText,
    /// Line does not contain the text.
    DoesNotContainText,
    /// Line matches the regular expression.
    DoesContainMatchRegex,
    /// Line does not match the regular expression.
    DoesNotContainMatchRegex,
}

/// One server-side log filter. Filters in a request are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLineFilter {
    /// Match operator.
    pub operator: LogLineOperator,
    /// Text or pattern to match.
    pub text_pattern: String,
}

impl LogLineFilter {
    /// Keep lines containing `text`.
    pub fn contains(text: impl Into<String>) -> Self {
        Self {
            operator: LogLineOperator::DoesContainText,
            text_pattern: text.into(),
        }
    }

    /// Drop lines containing `text`.
    pub fn not_contains(text: impl Into<String>) -> Self {
        Self {
            operator: LogLineOperator::DoesNotContainText,
            text_pattern: text.into(),
        }
    }

    /// Keep lines matching `pattern`.
    pub fn matches(pattern: impl Into<String>) -> Self {
        Self {
            operator: LogLineOperator::DoesContainMatchRegex,
            text_pattern: pattern.into(),
        }
    }

    /// Drop lines matching `pattern`.
    pub fn not_matches(pattern: impl Into<String>) -> Self {
        Self {
            operator: LogLineOperator::DoesNotContainMatchRegex,
            text_pattern: pattern.into(),
        }
    }
}

/// Severity of a [`ResponseInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseType {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error. Ends the stream.
    Error,
}

/// Status message the server sends in place of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseInfo {
    /// Severity.
    #[serde(rename = "type")]
    pub kind: ResponseType,
    /// Human readable message.
    pub message: String,
    /// HTTP-style status code.
    pub code: u32,
}

impl ResponseInfo {
    fn into_item<T>(self) -> StreamResult<LogFrame<T>> {
        match self.kind {
            ResponseType::Error => Err(StreamError::Server {
                code: self.code,
                message: self.message,
            }),
            ResponseType::Info | ResponseType::Warning => Ok(LogFrame::Info(self)),
        }
    }
}

impl fmt::Display for ResponseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} {}] {}", self.kind, self.code, self.message)
    }
}

/// One line of Starlark execution output. Its shape is owned by the engine
/// and passed through untouched.
pub type StarlarkRunResponseLine = serde_json::Value;

/// An item of an engine log stream.
#[derive(Debug, Clone, PartialEq)]
pub enum LogFrame<T> {
    /// Payload data.
    Data(T),
    /// Non-fatal status message.
    Info(ResponseInfo),
}

impl<T> LogFrame<T> {
    /// The payload, if this is a data frame.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Info(_) => None,
        }
    }
}

/// Decodes engine log frames.
///
/// Frames shaped like a [`ResponseInfo`] are recognised first. An `ERROR`
/// info becomes [`StreamError::Server`]; any other becomes
/// [`LogFrame::Info`]. Everything else is decoded as `T`.
///
/// The engine also answers a refused upgrade with a `ResponseInfo` body;
/// that body is mapped the same way.
pub struct LogFrameDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> LogFrameDecoder<T> {
    /// Create a decoder.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for LogFrameDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LogFrameDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFrameDecoder")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Decoder<LogFrame<T>> for LogFrameDecoder<T> {
    fn decode(&self, frame: &Frame) -> StreamResult<LogFrame<T>> {
        let payload = frame.as_bytes();

        if let Ok(info) = serde_json::from_slice::<ResponseInfo>(payload) {
            return info.into_item();
        }

        serde_json::from_slice(payload)
            .map(LogFrame::Data)
            .map_err(|e| StreamError::decode(e, payload))
    }

    fn decode_rejection(&self, _status: u16, body: &str) -> Option<StreamResult<LogFrame<T>>> {
        serde_json::from_str::<ResponseInfo>(body)
            .ok()
            .map(ResponseInfo::into_item)
    }
}
