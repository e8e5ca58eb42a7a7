//! Links a caller-owned cancellation token to a connection handle.
//!
//! The token is only observed, never cancelled. The listener is a child of
//! the caller's token; it is released as soon as the handle closes, so a
//! long-lived token does not accumulate listeners across streams.

use streamcall_core::CancellationToken;
use tracing::debug;

use crate::handle::{CloseCause, ConnectionHandle};

/// Outcome of [`subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// A listener is registered; the handle closes when the token fires.
    Linked,
    /// The token had already fired. The handle was closed on the spot.
    ClosedImmediately,
    /// The handle was already closed; nothing was registered.
    Inactive,
}

/// Tie `token` to `handle`.
///
/// If `token` is already cancelled the handle is closed before this returns
/// and no wait for frames should begin.
pub fn subscribe(token: &CancellationToken, handle: &mut ConnectionHandle) -> Subscription {
    if !handle.is_open() {
        return Subscription::Inactive;
    }

    if token.is_cancelled() {
        debug!(id = %handle.id(), "Token already cancelled at subscribe");
        handle.close(CloseCause::Cancelled);
        return Subscription::ClosedImmediately;
    }

    handle.link_cancellation(token.child_token());
    Subscription::Linked
}
