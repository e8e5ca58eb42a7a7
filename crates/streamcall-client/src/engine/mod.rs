//! Typed streaming operations of the engine API.
//!
//! | Operation | Path | Item |
//! |---|---|---|
//! | [`StreamClient::enclave_logs`] | `/enclaves/{enclave_identifier}/logs` | [`ServiceLogs`] |
//! | [`StreamClient::service_logs`] | `/enclaves/{enclave_identifier}/services/{service_identifier}/logs` | [`ServiceLogs`] |
//! | [`StreamClient::starlark_execution_logs`] | `/starlark/executions/{starlark_execution_uuid}/logs` | [`StarlarkRunResponseLine`] |

mod types;

pub use types::{
    LogFrame, LogFrameDecoder, LogLine, LogLineFilter, LogLineOperator, ResponseInfo,
    ResponseType, ServiceLogs, StarlarkRunResponseLine,
};

use streamcall_core::{CancellationToken, OperationKey, QueryParams, StreamError, StreamResult};

use crate::client::{RequestOptions, StreamClient};
use crate::stream::ResponseStream;

/// Path of the enclave-wide log stream.
pub const ENCLAVE_LOGS_PATH: &str = "/enclaves/{enclave_identifier}/logs";

/// Path of the single-service log stream.
pub const SERVICE_LOGS_PATH: &str =
    "/enclaves/{enclave_identifier}/services/{service_identifier}/logs";

/// Path of the Starlark execution log stream.
pub const STARLARK_EXECUTION_LOGS_PATH: &str =
    "/starlark/executions/{starlark_execution_uuid}/logs";

/// Query options shared by the service log streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceLogsRequest {
    /// Services to stream. Required by [`StreamClient::enclave_logs`],
    /// ignored by [`StreamClient::service_logs`].
    pub service_uuid_set: Vec<String>,
    /// Keep the stream open and push new lines as they are written.
    pub follow_logs: Option<bool>,
    /// Send the full history instead of the last `num_log_lines`.
    pub return_all_logs: Option<bool>,
    /// Number of historical lines to send.
    pub num_log_lines: Option<u32>,
    /// Filters, all of which a line must pass.
    pub conjunctive_filters: Vec<LogLineFilter>,
}

impl ServiceLogsRequest {
    /// Request logs for the given services.
    pub fn new<I, S>(service_uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service_uuid_set: service_uuids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Follow new lines
    pub fn with_follow_logs(mut self, follow: bool) -> Self {
        self.follow_logs = Some(follow);
        self
    }

    /// Send the full history
    pub fn with_return_all_logs(mut self, all: bool) -> Self {
        self.return_all_logs = Some(all);
        self
    }

    /// Limit the history
    pub fn with_num_log_lines(mut self, lines: u32) -> Self {
        self.num_log_lines = Some(lines);
        self
    }

    /// Add a filter
    pub fn with_filter(mut self, filter: LogLineFilter) -> Self {
        self.conjunctive_filters.push(filter);
        self
    }

    /// Render as query parameters. Each filter is sent as one JSON document
    /// under a repeated `conjunctive_filters` key.
    pub fn query_params(&self, include_service_uuids: bool) -> StreamResult<QueryParams> {
        let mut params = QueryParams::new()
            .with_opt("follow_logs", self.follow_logs)
            .with_opt("return_all_logs", self.return_all_logs)
            .with_opt("num_log_lines", self.num_log_lines);

        if include_service_uuids {
            params.insert("service_uuid_set", self.service_uuid_set.clone());
        }

        if !self.conjunctive_filters.is_empty() {
            let filters = self
                .conjunctive_filters
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StreamError::Configuration(format!("Invalid log filter: {e}")))?;
            params.insert("conjunctive_filters", filters);
        }

        Ok(params)
    }
}

/// Operation key for [`StreamClient::enclave_logs`].
pub fn enclave_logs_operation(enclave_identifier: &str) -> OperationKey {
    OperationKey::new("enclave_logs", ENCLAVE_LOGS_PATH)
        .with_path_param("enclave_identifier", enclave_identifier)
}

/// Operation key for [`StreamClient::service_logs`].
pub fn service_logs_operation(enclave_identifier: &str, service_identifier: &str) -> OperationKey {
    OperationKey::new("service_logs", SERVICE_LOGS_PATH)
        .with_path_param("enclave_identifier", enclave_identifier)
        .with_path_param("service_identifier", service_identifier)
}

/// Operation key for [`StreamClient::starlark_execution_logs`].
pub fn starlark_execution_logs_operation(starlark_execution_uuid: &str) -> OperationKey {
    OperationKey::new("starlark_execution_logs", STARLARK_EXECUTION_LOGS_PATH)
        .with_path_param("starlark_execution_uuid", starlark_execution_uuid)
}

fn log_options<T>(
    params: QueryParams,
    cancellation: Option<CancellationToken>,
) -> RequestOptions<LogFrame<T>> {
    let options = RequestOptions::new().with_params(params);
    match cancellation {
        Some(token) => options.with_cancellation(token),
        None => options,
    }
}

impl StreamClient {
    /// Stream logs of several services in one enclave.
    ///
    /// `request.service_uuid_set` must not be empty.
    pub fn enclave_logs(
        &self,
        enclave_identifier: &str,
        request: &ServiceLogsRequest,
        cancellation: Option<CancellationToken>,
    ) -> ResponseStream<LogFrame<ServiceLogs>> {
        if request.service_uuid_set.is_empty() {
            return ResponseStream::failed(StreamError::Configuration(
                "service_uuid_set must name at least one service".to_string(),
            ));
        }
        let params = match request.query_params(true) {
            Ok(params) => params,
            Err(e) => return ResponseStream::failed(e),
        };

        self.stream_with_decoder(
            &enclave_logs_operation(enclave_identifier),
            log_options(params, cancellation),
            LogFrameDecoder::new(),
        )
    }

    /// Stream logs of one service.
    pub fn service_logs(
        &self,
        enclave_identifier: &str,
        service_identifier: &str,
        request: &ServiceLogsRequest,
        cancellation: Option<CancellationToken>,
    ) -> ResponseStream<LogFrame<ServiceLogs>> {
        let params = match request.query_params(false) {
            Ok(params) => params,
            Err(e) => return ResponseStream::failed(e),
        };

        self.stream_with_decoder(
            &service_logs_operation(enclave_identifier, service_identifier),
            log_options(params, cancellation),
            LogFrameDecoder::new(),
        )
    }

    /// Stream the output of an asynchronous Starlark run.
    ///
    /// An unknown or already consumed execution is refused by the engine with
    /// an HTTP 404 carrying a [`ResponseInfo`]; the stream then yields that
    /// info as a single [`LogFrame::Info`]. An `ERROR` response ends the
    /// stream with [`StreamError::Server`].
    pub fn starlark_execution_logs(
        &self,
        starlark_execution_uuid: &str,
        cancellation: Option<CancellationToken>,
    ) -> ResponseStream<LogFrame<StarlarkRunResponseLine>> {
        self.stream_with_decoder(
            &starlark_execution_logs_operation(starlark_execution_uuid),
            log_options(QueryParams::new(), cancellation),
            LogFrameDecoder::new(),
        )
    }
}
