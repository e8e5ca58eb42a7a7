//! Connection traits.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::StreamResult;
use crate::frame::ConnectionEvent;

/// Opens duplex, message-framed connections.
///
/// A connector is shared by every stream a client starts; each call to
/// [`connect`](Connector::connect) produces a brand new connection.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens a connection to `url`, suspending until it is open.
    ///
    /// Failures carry the dialed host and the transport's reason. No retry is
    /// attempted.
    fn connect<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = StreamResult<Box<dyn Connection>>> + Send + 'a>>;
}

/// One open duplex connection.
///
/// Implementations deliver events in wire-arrival order. After
/// [`ConnectionEvent::Closed`] or [`ConnectionEvent::Failed`] has been
/// returned, further calls to [`recv`](Connection::recv) keep returning
/// `Closed`.
pub trait Connection: Send + fmt::Debug {
    /// Waits for the next inbound event.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = ConnectionEvent> + Send + '_>>;

    /// Releases the connection. Must not block; the owner calls it once.
    fn close(&mut self);

    /// Ties the connection to a cancellation signal so the transport can be
    /// released as soon as the signal fires, even while nobody is waiting in
    /// [`recv`](Connection::recv).
    fn watch_cancellation(&mut self, token: CancellationToken) {
        let _ = token;
    }

    /// Returns the remote endpoint, if known.
    fn endpoint(&self) -> Option<String> {
        None
    }
}
