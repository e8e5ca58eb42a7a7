//! Client facade.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use streamcall_core::{
    BaseAddress, CancellationToken, Connector, Decoder, DefaultUrlResolver, JsonDecoder,
    OperationKey, ParamValue, QueryParams, StreamResult, UrlResolver,
};
use streamcall_websocket::WebSocketConnector;
use tracing::debug;

use crate::config::ClientConfig;
use crate::stream::ResponseStream;

/// Per-call options for a streaming operation.
pub struct RequestOptions<T> {
    params: QueryParams,
    cancellation: Option<CancellationToken>,
    decoder: Option<Arc<dyn Decoder<T>>>,
}

impl<T> Default for RequestOptions<T> {
    fn default() -> Self {
        Self {
            params: QueryParams::new(),
            cancellation: None,
            decoder: None,
        }
    }
}

impl<T> fmt::Debug for RequestOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("params", &self.params)
            .field("cancellation", &self.cancellation.is_some())
            .field("custom_decoder", &self.decoder.is_some())
            .finish()
    }
}

impl<T> RequestOptions<T> {
    /// Options with no parameters, no cancellation and the JSON decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the query parameters
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Add one query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Attach a cancellation token. The token is observed, never cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Override the frame decoder
    pub fn with_decoder(mut self, decoder: impl Decoder<T> + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Query parameters.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

/// Immutable description of one streaming call, fixed when the call is made.
pub(crate) struct RequestDescriptor<T> {
    pub(crate) operation: OperationKey,
    pub(crate) params: QueryParams,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) decoder: Arc<dyn Decoder<T>>,
}

/// Entry point for streaming operations.
///
/// Every call opens a brand new connection; connections are never pooled or
/// shared between calls. Cloning the client is cheap.
///
/// ```rust,ignore
/// let client = StreamClient::new(ClientConfig::new("http://localhost:9779"))?;
/// let operation = OperationKey::new("starlark_logs", "/starlark/executions/{uuid}/logs")
///     .with_path_param("uuid", execution_uuid);
/// let mut lines = client.stream_json(&operation, RequestOptions::new());
/// while let Some(line) = lines.next().await {
///     println!("{}", line?);
/// }
/// ```
#[derive(Clone)]
pub struct StreamClient {
    config: Arc<ClientConfig>,
    resolver: Arc<dyn UrlResolver>,
    connector: Arc<dyn Connector>,
}

impl fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamClient")
            .field("base_url", &self.config.base_url)
            .field("resolver", &self.resolver)
            .field("connector", &self.connector)
            .finish()
    }
}

impl StreamClient {
    /// Create a client with the default resolver and WebSocket connector.
    ///
    /// Fails if the configured base address is invalid.
    pub fn new(config: ClientConfig) -> StreamResult<Self> {
        StreamClientBuilder::new(config).build()
    }

    /// Start building a client with custom collaborators.
    pub fn builder(config: ClientConfig) -> StreamClientBuilder {
        StreamClientBuilder::new(config)
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a streaming operation decoding each frame into `T`.
    ///
    /// Returns immediately; the connection is opened on the first pull.
    /// Resolution and connection failures surface as the first and only
    /// item of the returned stream.
    pub fn stream<T>(
        &self,
        operation: &OperationKey,
        options: RequestOptions<T>,
    ) -> ResponseStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.start(operation, options, || Arc::new(JsonDecoder::<T>::new()))
    }

    /// Start a streaming operation whose items have no JSON shape of their
    /// own; `decoder` is used unless `options` carries an override.
    pub fn stream_with_decoder<T>(
        &self,
        operation: &OperationKey,
        options: RequestOptions<T>,
        decoder: impl Decoder<T> + 'static,
    ) -> ResponseStream<T>
    where
        T: Send + 'static,
    {
        self.start(operation, options, move || Arc::new(decoder))
    }

    fn start<T: Send + 'static>(
        &self,
        operation: &OperationKey,
        options: RequestOptions<T>,
        default_decoder: impl FnOnce() -> Arc<dyn Decoder<T>>,
    ) -> ResponseStream<T> {
        let RequestOptions {
            params,
            cancellation,
            decoder,
        } = options;

        let request = RequestDescriptor {
            operation: operation.clone(),
            params,
            cancellation,
            decoder: decoder.unwrap_or_else(default_decoder),
        };
        let url = self.resolver.resolve(&request.operation, &request.params);
        debug!(operation = %request.operation, "Starting streaming operation");

        ResponseStream::open(self.connector.clone(), url, request, self.config.stream)
    }

    /// Start a streaming operation yielding raw JSON values.
    pub fn stream_json(
        &self,
        operation: &OperationKey,
        options: RequestOptions<serde_json::Value>,
    ) -> ResponseStream<serde_json::Value> {
        self.stream(operation, options)
    }
}

/// Builder for [`StreamClient`].
#[derive(Debug)]
pub struct StreamClientBuilder {
    config: ClientConfig,
    resolver: Option<Arc<dyn UrlResolver>>,
    connector: Option<Arc<dyn Connector>>,
}

impl StreamClientBuilder {
    /// Create a builder.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            resolver: None,
            connector: None,
        }
    }

    /// Use a custom URL resolver. The base address is then not parsed.
    pub fn with_resolver(mut self, resolver: impl UrlResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Use a custom connector instead of [`WebSocketConnector`].
    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Build the client.
    pub fn build(self) -> StreamResult<StreamClient> {
        let resolver: Arc<dyn UrlResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DefaultUrlResolver::new(BaseAddress::parse(
                &self.config.base_url,
            )?)),
        };
        let connector: Arc<dyn Connector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(WebSocketConnector::new(self.config.websocket.clone())),
        };

        Ok(StreamClient {
            config: Arc::new(self.config),
            resolver,
            connector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamcall_core::StreamError;

    #[test]
    fn test_new_rejects_bad_base_address() {
        let err = StreamClient::new(ClientConfig::new("ftp://localhost")).unwrap_err();
        assert!(matches!(err, StreamError::Configuration(_)));
    }

    #[test]
    fn test_new_leaves_config_untouched() {
        let client = StreamClient::new(ClientConfig::new("http://localhost:9779/")).unwrap();
        assert_eq!(client.config().base_url, "http://localhost:9779/");
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::<u32>::new()
            .with_param("follow_logs", true)
            .with_cancellation(CancellationToken::new());
        assert!(options.params().get("follow_logs").is_some());
        assert!(format!("{options:?}").contains("cancellation: true"));
    }
}
