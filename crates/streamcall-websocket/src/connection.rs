//! An open WebSocket connection.

use std::future::Future;
use std::pin::Pin;

use streamcall_core::{Connection, ConnectionEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::tasks::{ClientStream, spawn_reader_task};

/// One open WebSocket, read by a background task.
///
/// Dropping the connection stops the reader, which then closes the socket.
#[derive(Debug)]
pub struct WebSocketConnection {
    id: Uuid,
    endpoint: String,
    incoming_rx: mpsc::Receiver<ConnectionEvent>,
    shutdown: CancellationToken,
    reader: JoinHandle<()>,
    finished: bool,
}

impl WebSocketConnection {
    pub(crate) fn start(endpoint: String, stream: ClientStream, queue_capacity: usize) -> Self {
        let id = Uuid::new_v4();
        let (incoming_tx, incoming_rx) = mpsc::channel(queue_capacity.max(1));
        let shutdown = CancellationToken::new();
        let reader = spawn_reader_task(id, stream, incoming_tx, shutdown.clone());

        Self {
            id,
            endpoint,
            incoming_rx,
            shutdown,
            reader,
            finished: false,
        }
    }

    /// Unique id used in log output.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns `true` once the reader task has exited.
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }
}

impl Connection for WebSocketConnection {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = ConnectionEvent> + Send + '_>> {
        Box::pin(async move {
            if self.finished {
                return ConnectionEvent::Closed(None);
            }
            let event = self
                .incoming_rx
                .recv()
                .await
                .unwrap_or(ConnectionEvent::Closed(None));
            if !matches!(event, ConnectionEvent::Frame(_)) {
                self.finished = true;
            }
            event
        })
    }

    fn close(&mut self) {
        if !self.shutdown.is_cancelled() {
            debug!("Closing connection {} to {}", self.id, self.endpoint);
        }
        self.finished = true;
        self.shutdown.cancel();
        self.incoming_rx.close();
    }

    fn watch_cancellation(&mut self, token: CancellationToken) {
        let shutdown = self.shutdown.clone();
        let id = self.id;
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!("Cancellation requested for connection {}", id);
                    shutdown.cancel();
                }
                () = shutdown.cancelled() => {}
            }
        });
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.endpoint.clone())
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
