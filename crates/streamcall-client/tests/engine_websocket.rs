//! End-to-end tests of the engine log operations over a real WebSocket.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use streamcall_client::engine::{LogFrame, LogLineFilter, ResponseType, ServiceLogsRequest};
use streamcall_client::{CancellationToken, ClientConfig, StreamClient, StreamError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

const WAIT: Duration = Duration::from_secs(5);

/// Engine stand-in: records the request URI, plays `frames`, then closes
/// unless `hold_open` is set.
struct EngineServer {
    base_url: String,
    uri_rx: mpsc::UnboundedReceiver<String>,
    disconnected_rx: mpsc::UnboundedReceiver<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl EngineServer {
    async fn start(frames: Vec<String>, hold_open: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (uri_tx, uri_rx) = mpsc::unbounded_channel();
        let (disconnected_tx, disconnected_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let frames = frames.clone();
                let uri_tx = uri_tx.clone();
                let disconnected_tx = disconnected_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = Self::serve(stream, frames, hold_open, uri_tx).await {
                        eprintln!("Connection error: {}", e);
                    }
                    let _ = disconnected_tx.send(());
                });
            }
        });

        Self {
            base_url: format!("http://{addr}/"),
            uri_rx,
            disconnected_rx,
            handle,
        }
    }

    async fn serve(
        stream: TcpStream,
        frames: Vec<String>,
        hold_open: bool,
        uri_tx: mpsc::UnboundedSender<String>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut ws = accept_hdr_async(stream, |request: &Request, response: Response| {
            let _ = uri_tx.send(request.uri().to_string());
            Ok::<_, ErrorResponse>(response)
        })
        .await?;

        for frame in frames {
            ws.send(Message::Text(frame.into())).await?;
        }
        if !hold_open {
            ws.close(None).await?;
        }
        while let Some(msg) = ws.next().await {
            if matches!(msg?, Message::Close(_)) {
                break;
            }
        }
        Ok(())
    }

    fn client(&self) -> StreamClient {
        StreamClient::new(ClientConfig::new(self.base_url.clone())).unwrap()
    }
}

impl Drop for EngineServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn service_logs_frame(service: &str, lines: &[&str]) -> String {
    let mut by_service = serde_json::Map::new();
    by_service.insert(
        service.to_string(),
        json!({ "line": lines, "timestamp": "2024-05-01T10:00:00Z" }),
    );
    json!({
        "service_logs_by_service_uuid": by_service,
        "not_found_service_uuid_set": []
    })
    .to_string()
}

/// Answers the first upgrade request with a plain HTTP response instead of
/// switching protocols, the way the engine reports unknown streams.
async fn refuse_upgrade(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        let _ = stream.read(&mut buf).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_enclave_logs_end_to_end() {
    let mut server = EngineServer::start(
        vec![
            service_logs_frame("svc-a", &["booting"]),
            service_logs_frame("svc-a", &["ready", "listening on 8080"]),
        ],
        false,
    )
    .await;

    let request = ServiceLogsRequest::new(["svc-a"])
        .with_follow_logs(true)
        .with_filter(LogLineFilter::contains("e"));
    let items: Vec<_> = server
        .client()
        .enclave_logs("test enclave", &request, None)
        .collect()
        .await;

    let uri = server.uri_rx.recv().await.unwrap();
    assert!(uri.starts_with("/enclaves/test%20enclave/logs?"), "{uri}");
    assert!(uri.contains("follow_logs=true"), "{uri}");
    assert!(uri.contains("service_uuid_set=svc-a"), "{uri}");
    assert!(uri.contains("conjunctive_filters="), "{uri}");

    let lines: Vec<Vec<String>> = items
        .into_iter()
        .map(|item| match item.unwrap() {
            LogFrame::Data(logs) => logs.service_logs_by_service_uuid["svc-a"].line.clone(),
            LogFrame::Info(info) => panic!("unexpected info: {info}"),
        })
        .collect();
    assert_eq!(
        lines,
        vec![
            vec!["booting".to_string()],
            vec!["ready".to_string(), "listening on 8080".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_server_error_frame_ends_stream() {
    let server = EngineServer::start(
        vec![
            service_logs_frame("svc-a", &["one"]),
            json!({"type": "ERROR", "message": "Failed to stream all data", "code": 500}).to_string(),
            service_logs_frame("svc-a", &["never delivered"]),
        ],
        true,
    )
    .await;

    let items: Vec<_> = server
        .client()
        .service_logs("enclave", "svc-a", &ServiceLogsRequest::default(), None)
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Ok(LogFrame::Data(_))));
    assert_eq!(
        items[1],
        Err(StreamError::Server {
            code: 500,
            message: "Failed to stream all data".into()
        })
    );
}

#[tokio::test]
async fn test_starlark_not_found_info() {
    let server = EngineServer::start(
        vec![
            json!({
                "type": "INFO",
                "message": "Log streaming 'abc' not found. Either it has been consumed or has expired.",
                "code": 404
            })
            .to_string(),
        ],
        false,
    )
    .await;

    let items: Vec<_> = server
        .client()
        .starlark_execution_logs("abc", None)
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    match &items[0] {
        Ok(LogFrame::Info(info)) => {
            assert_eq!(info.kind, ResponseType::Info);
            assert_eq!(info.code, 404);
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_releases_real_socket() {
    let mut server =
        EngineServer::start(vec![service_logs_frame("svc-a", &["first"])], true).await;
    let token = CancellationToken::new();

    let mut stream = server.client().service_logs(
        "enclave",
        "svc-a",
        &ServiceLogsRequest::default().with_follow_logs(true),
        Some(token.clone()),
    );
    assert!(matches!(stream.next().await, Some(Ok(LogFrame::Data(_)))));

    token.cancel();
    timeout(WAIT, server.disconnected_rx.recv())
        .await
        .expect("socket was not released after cancellation")
        .unwrap();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_refused_connection_reports_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = StreamClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap();
    let items: Vec<_> = client.starlark_execution_logs("abc", None).collect().await;

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(StreamError::Connection { host, reason }) => {
            assert_eq!(host, "127.0.0.1");
            assert!(!reason.is_empty());
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_enclave_logs_requires_services() {
    let client = StreamClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
    let items: Vec<_> = client
        .enclave_logs("enclave", &ServiceLogsRequest::default(), None)
        .collect()
        .await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(StreamError::Configuration(_))));
}

#[tokio::test]
async fn test_refused_starlark_stream_yields_info() {
    let base_url = refuse_upgrade(
        "404 Not Found",
        r#"{"type":"INFO","message":"Log streaming 'abc' not found. Either it has already been consumed or it never existed","code":404}"#,
    )
    .await;

    let client = StreamClient::new(ClientConfig::new(base_url)).unwrap();
    let items: Vec<_> = timeout(WAIT, client.starlark_execution_logs("abc", None).collect())
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    match &items[0] {
        Ok(LogFrame::Info(info)) => {
            assert_eq!(info.kind, ResponseType::Info);
            assert_eq!(info.code, 404);
            assert!(info.message.contains("'abc' not found"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_refused_service_logs_yields_server_error() {
    let base_url = refuse_upgrade(
        "500 Internal Server Error",
        r#"{"type":"ERROR","message":"Failed to start websocket pump","code":500}"#,
    )
    .await;

    let client = StreamClient::new(ClientConfig::new(base_url)).unwrap();
    let items: Vec<_> = timeout(
        WAIT,
        client
            .service_logs("enclave", "svc", &ServiceLogsRequest::default(), None)
            .collect(),
    )
    .await
    .unwrap();

    assert_eq!(
        items,
        vec![Err(StreamError::Server {
            code: 500,
            message: "Failed to start websocket pump".into(),
        })]
    );
}
