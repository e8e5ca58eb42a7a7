//! Shared test infrastructure: a scripted in-memory connector.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use streamcall_client::{
    ClientConfig, CloseInfo, Connection, ConnectionEvent, Connector, Frame, StreamClient,
    StreamConfig, StreamError, StreamResult,
};
use tokio::sync::mpsc;
use url::Url;

pub const BASE_URL: &str = "http://localhost:9779";

/// Behaviour of [`MockConnector::connect`].
#[derive(Debug, Clone)]
enum OpenBehaviour {
    Succeed,
    Fail(StreamError),
    Hang,
}

/// Connector whose single connection is fed by a [`MockPeer`].
#[derive(Debug, Clone)]
pub struct MockConnector {
    behaviour: OpenBehaviour,
    rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    urls: Arc<Mutex<Vec<String>>>,
}

/// The remote side of a mock connection.
#[derive(Debug, Clone)]
pub struct MockPeer {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl MockPeer {
    pub fn send_text(&self, text: &str) -> &Self {
        let _ = self.tx.send(ConnectionEvent::Frame(Frame::from(text)));
        self
    }

    pub fn close(&self) {
        let _ = self.tx.send(ConnectionEvent::Closed(Some(CloseInfo::new(1000, ""))));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self
            .tx
            .send(ConnectionEvent::Failed(StreamError::ConnectionLost(reason.into())));
    }
}

impl MockConnector {
    pub fn new() -> (Self, MockPeer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self::with_behaviour(OpenBehaviour::Succeed, Some(rx)),
            MockPeer { tx },
        )
    }

    pub fn failing(error: StreamError) -> Self {
        Self::with_behaviour(OpenBehaviour::Fail(error), None)
    }

    pub fn hanging() -> Self {
        Self::with_behaviour(OpenBehaviour::Hang, None)
    }

    fn with_behaviour(
        behaviour: OpenBehaviour,
        rx: Option<mpsc::UnboundedReceiver<ConnectionEvent>>,
    ) -> Self {
        Self {
            behaviour,
            rx: Arc::new(Mutex::new(rx)),
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn client(&self, stream: StreamConfig) -> StreamClient {
        StreamClient::builder(ClientConfig::new(BASE_URL).with_stream_config(stream))
            .with_connector(self.clone())
            .build()
            .unwrap()
    }
}

impl Connector for MockConnector {
    fn connect<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = StreamResult<Box<dyn Connection>>> + Send + 'a>> {
        Box::pin(async move {
            self.urls.lock().unwrap().push(url.to_string());
            match &self.behaviour {
                OpenBehaviour::Fail(error) => Err(error.clone()),
                OpenBehaviour::Hang => std::future::pending().await,
                OpenBehaviour::Succeed => {
                    let rx = self
                        .rx
                        .lock()
                        .unwrap()
                        .take()
                        .expect("mock connector opened twice");
                    self.opens.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(MockConnection {
                        rx,
                        closes: self.closes.clone(),
                        closed: false,
                    }) as Box<dyn Connection>)
                }
            }
        })
    }
}

#[derive(Debug)]
struct MockConnection {
    rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

impl Connection for MockConnection {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = ConnectionEvent> + Send + '_>> {
        Box::pin(async move {
            if self.closed {
                return ConnectionEvent::Closed(None);
            }
            self.rx
                .recv()
                .await
                .unwrap_or(ConnectionEvent::Closed(None))
        })
    }

    fn close(&mut self) {
        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn endpoint(&self) -> Option<String> {
        Some("mock://peer".to_string())
    }
}
