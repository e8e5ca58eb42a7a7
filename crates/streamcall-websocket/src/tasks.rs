//! Background reader task.
//!
//! Each connection owns exactly one reader. It is the single consumer of the
//! socket and forwards every inbound event, in arrival order, into a bounded
//! queue that [`WebSocketConnection::recv`](crate::WebSocketConnection) awaits.

use futures::StreamExt as _;
use streamcall_core::{CloseInfo, ConnectionEvent, Frame, StreamError};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

pub(crate) type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawn the reader for one connection.
///
/// The task ends when the peer closes, the socket fails, the consumer drops
/// its receiver, or `shutdown` fires. In every case the socket is closed
/// before the task returns.
pub(crate) fn spawn_reader_task(
    connection_id: Uuid,
    mut stream: ClientStream,
    incoming_tx: mpsc::Sender<ConnectionEvent>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Reader task started for connection {}", connection_id);
        let mut frames = 0u64;

        loop {
            let event = tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    debug!("Reader task received shutdown signal for connection {}", connection_id);
                    break;
                }

                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        frames += 1;
                        trace!(
                            "Text frame #{} ({} bytes) on connection {}",
                            frames,
                            text.len(),
                            connection_id
                        );
                        ConnectionEvent::Frame(Frame::Text(text.as_str().to_string()))
                    }
                    Some(Ok(Message::Binary(data))) => {
                        frames += 1;
                        trace!(
                            "Binary frame #{} ({} bytes) on connection {}",
                            frames,
                            data.len(),
                            connection_id
                        );
                        ConnectionEvent::Frame(Frame::Binary(data))
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        trace!("Control frame on connection {}", connection_id);
                        continue;
                    }
                    Some(Ok(Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(frame))) => {
                        let info =
                            frame.map(|f| CloseInfo::new(u16::from(f.code), f.reason.as_str()));
                        match &info {
                            Some(info) if !info.is_normal() => {
                                warn!("Connection {} closed by peer: {}", connection_id, info);
                            }
                            _ => info!("Connection {} closed by peer", connection_id),
                        }
                        ConnectionEvent::Closed(info)
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error on connection {}: {}", connection_id, e);
                        ConnectionEvent::Failed(StreamError::ConnectionLost(e.to_string()))
                    }
                    None => {
                        info!("WebSocket stream ended for connection {}", connection_id);
                        ConnectionEvent::Closed(None)
                    }
                },
            };

            let terminal = !matches!(event, ConnectionEvent::Frame(_));

            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,
                sent = incoming_tx.send(event) => {
                    if sent.is_err() {
                        debug!("Consumer for connection {} went away", connection_id);
                        break;
                    }
                }
            }

            if terminal {
                break;
            }
        }

        if let Err(e) = stream.close(None).await {
            trace!("Close handshake on connection {} ended with: {}", connection_id, e);
        }
        debug!(
            "Reader task terminated for connection {} after {} frames",
            connection_id, frames
        );
    })
}
