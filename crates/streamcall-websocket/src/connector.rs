//! WebSocket connector.

use std::future::Future;
use std::pin::Pin;

use streamcall_core::{Connection, Connector, StreamError, StreamResult};
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::USER_AGENT;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::WebSocketConfig;
use crate::connection::WebSocketConnection;

/// Opens one WebSocket per call to [`Connector::connect`].
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    config: WebSocketConfig,
}

impl WebSocketConnector {
    /// Create a connector with the given configuration.
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// The connector's configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    async fn open(&self, url: &Url) -> StreamResult<WebSocketConnection> {
        let host = url.host_str().unwrap_or(url.as_str()).to_string();

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(StreamError::connection(
                    host,
                    format!("unsupported scheme '{other}'"),
                ));
            }
        }

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| StreamError::connection(host.clone(), e))?;
        if let Some(user_agent) = &self.config.user_agent {
            let value = HeaderValue::from_str(user_agent).map_err(|e| {
                StreamError::Configuration(format!("Invalid user agent '{user_agent}': {e}"))
            })?;
            request.headers_mut().insert(USER_AGENT, value);
        }

        debug!("Opening WebSocket connection to {}", url);
        let (stream, response) = connect_async_with_config(
            request,
            Some(self.config.protocol_config()),
            self.config.disable_nagle,
        )
        .await
        .map_err(|e| {
            warn!("WebSocket connection to {} failed: {}", host, e);
            match e {
                WsError::Http(response) => {
                    let body = response.body().as_deref().unwrap_or_default();
                    StreamError::rejected(host.clone(), response.status().as_u16(), body)
                }
                other => StreamError::connection(host.clone(), other),
            }
        })?;

        info!(
            "WebSocket connected to {} (status {})",
            url,
            response.status()
        );
        Ok(WebSocketConnection::start(
            url.to_string(),
            stream,
            self.config.queue_capacity,
        ))
    }
}

impl Connector for WebSocketConnector {
    fn connect<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = StreamResult<Box<dyn Connection>>> + Send + 'a>> {
        Box::pin(async move {
            let connection = self.open(url).await?;
            Ok(Box::new(connection) as Box<dyn Connection>)
        })
    }
}
