//! Connection lifecycle management.
//!
//! A [`ConnectionHandle`] owns one open [`Connection`] and enforces the
//! lifecycle `Open -> Closing -> Closed`. The `Connecting` phase is the
//! pending [`ConnectionHandle::open`] future: a handle only exists once the
//! socket is open, and a failed open never produces one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streamcall_core::{
    CancellationToken, CloseInfo, Connection, ConnectionEvent, ConnectionState, Connector, Frame,
    StreamError, StreamResult,
};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Why a handle was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CloseCause {
    /// The peer closed the connection.
    Remote {
        /// Close frame sent by the peer, if any.
        info: Option<CloseInfo>,
    },
    /// The caller's cancellation token fired.
    Cancelled,
    /// The transport failed after the connection was open.
    Failed,
    /// A frame could not be decoded and the stream stopped.
    DecodeFailed,
    /// The stream finished on its own.
    Finished,
    /// The owning stream was dropped before it finished.
    Dropped,
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { info: Some(info) } => write!(f, "closed by peer ({info})"),
            Self::Remote { info: None } => write!(f, "closed by peer"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "transport failure"),
            Self::DecodeFailed => write!(f, "decode failure"),
            Self::Finished => write!(f, "finished"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

/// Diagnostics for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStats {
    /// Frames received from the peer.
    pub frames_received: u64,
    /// Payload bytes received from the peer.
    pub bytes_received: u64,
    /// When the connection reached the open state.
    pub opened_at: DateTime<Utc>,
    /// When the connection was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Why the connection was closed.
    pub close_cause: Option<CloseCause>,
}

/// Result of waiting on a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A frame arrived.
    Frame(Frame),
    /// The handle is closed. No further frames follow.
    Closed(CloseCause),
    /// The transport failed. The handle is closed.
    Failed(StreamError),
}

/// Exclusive owner of one open connection.
pub struct ConnectionHandle {
    id: Uuid,
    endpoint: String,
    connection: Box<dyn Connection>,
    state: ConnectionState,
    cancel_link: Option<CancellationToken>,
    stats: ConnectionStats,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("linked", &self.cancel_link.is_some())
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    /// Open a connection to `url`, suspending until it is open.
    ///
    /// Fails without producing a handle when the connection cannot be
    /// established. No retry is attempted.
    pub async fn open(connector: &dyn Connector, url: &Url) -> StreamResult<Self> {
        debug!(url = %url, state = %ConnectionState::Connecting, "Opening connection");
        let connection = connector.connect(url).await?;
        Ok(Self::from_connection(connection, url.to_string()))
    }

    /// Wrap an already open connection.
    pub fn from_connection(connection: Box<dyn Connection>, endpoint: String) -> Self {
        let id = Uuid::new_v4();
        let endpoint = connection.endpoint().unwrap_or(endpoint);
        debug!(%id, %endpoint, state = %ConnectionState::Open, "Connection open");
        Self {
            id,
            endpoint,
            connection,
            state: ConnectionState::Open,
            cancel_link: None,
            stats: ConnectionStats {
                frames_received: 0,
                bytes_received: 0,
                opened_at: Utc::now(),
                closed_at: None,
                close_cause: None,
            },
        }
    }

    /// Handle id used in log output.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The remote endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` while frames may still be delivered.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Returns `true` while a cancellation listener is registered.
    pub const fn is_linked(&self) -> bool {
        self.cancel_link.is_some()
    }

    /// Connection diagnostics.
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Register a cancellation listener. Replaces any previous listener.
    pub(crate) fn link_cancellation(&mut self, token: CancellationToken) {
        if !self.is_open() {
            return;
        }
        self.connection.watch_cancellation(token.clone());
        self.cancel_link = Some(token);
    }

    /// Wait for the next frame or terminal event.
    ///
    /// A fired cancellation listener wins over frames that are already
    /// queued. Once the handle is closed every call returns
    /// [`Delivery::Closed`].
    pub async fn next(&mut self) -> Delivery {
        if !self.is_open() {
            return Delivery::Closed(
                self.stats
                    .close_cause
                    .clone()
                    .unwrap_or(CloseCause::Finished),
            );
        }

        let event = match self.cancel_link.clone() {
            Some(link) => tokio::select! {
                biased;

                () = link.cancelled() => None,
                event = self.connection.recv() => Some(event),
            },
            None => Some(self.connection.recv().await),
        };

        match event {
            None => {
                self.close(CloseCause::Cancelled);
                Delivery::Closed(CloseCause::Cancelled)
            }
            Some(ConnectionEvent::Frame(frame)) => {
                self.stats.frames_received += 1;
                self.stats.bytes_received += frame.len() as u64;
                Delivery::Frame(frame)
            }
            Some(ConnectionEvent::Closed(info)) => {
                let cause = CloseCause::Remote { info };
                self.close(cause.clone());
                Delivery::Closed(cause)
            }
            Some(ConnectionEvent::Failed(err)) => {
                self.close(CloseCause::Failed);
                Delivery::Failed(err)
            }
        }
    }

    /// Close the connection.
    ///
    /// Runs at most once per handle; returns `false` if the handle was
    /// already closing or closed. Drops the cancellation listener.
    pub fn close(&mut self, cause: CloseCause) -> bool {
        if !self.is_open() {
            return false;
        }

        self.state = ConnectionState::Closing;
        debug!(id = %self.id, state = %self.state, %cause, "Closing connection");
        self.cancel_link = None;
        self.connection.close();
        self.state = ConnectionState::Closed;

        info!(
            id = %self.id,
            endpoint = %self.endpoint,
            frames = self.stats.frames_received,
            %cause,
            "Connection closed"
        );
        self.stats.closed_at = Some(Utc::now());
        self.stats.close_cause = Some(cause);
        true
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close(CloseCause::Dropped);
    }
}
