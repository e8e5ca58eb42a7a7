//! The response stream returned by every streaming operation.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_stream::stream;
use futures::Stream;
use futures::stream::FusedStream;
use streamcall_core::{
    CancellationPolicy, Connector, DecodePolicy, StreamConfig, StreamError, StreamItem,
    StreamResult,
};
use tracing::{debug, warn};
use url::Url;

use crate::cancellation::{Subscription, subscribe};
use crate::client::RequestDescriptor;
use crate::handle::{CloseCause, ConnectionHandle, Delivery};

/// A lazy, ordered, non-restartable sequence of decoded responses.
///
/// Nothing happens until the stream is first polled: the connection is
/// opened on the first pull and released exactly once when the stream ends,
/// whether it runs to completion, fails, is cancelled or is dropped early.
///
/// The final item may be an `Err`; no item follows it.
#[must_use = "streams do nothing unless polled"]
pub struct ResponseStream<T> {
    inner: Pin<Box<dyn Stream<Item = StreamItem<T>> + Send>>,
    terminated: bool,
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ResponseStream<T> {
    pub(crate) fn open(
        connector: Arc<dyn Connector>,
        url: StreamResult<Url>,
        request: RequestDescriptor<T>,
        config: StreamConfig,
    ) -> Self {
        Self::from_stream(drive(connector, url, request, config))
    }

    /// A stream whose only item is `error`. No connection is opened.
    pub fn failed(error: StreamError) -> Self {
        Self::from_stream(futures::stream::once(futures::future::ready(Err(error))))
    }

    /// Wrap any stream of items. Used for tests and adapters.
    pub fn from_stream(stream: impl Stream<Item = StreamItem<T>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
            terminated: false,
        }
    }
}

impl<T> Stream for ResponseStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        let item = futures::ready!(self.inner.as_mut().poll_next(cx));
        if item.is_none() {
            self.terminated = true;
        }
        Poll::Ready(item)
    }
}

impl<T> FusedStream for ResponseStream<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

fn cancelled<T>(policy: CancellationPolicy) -> Option<StreamItem<T>> {
    match policy {
        CancellationPolicy::Silent => None,
        CancellationPolicy::Error => Some(Err(StreamError::Cancelled)),
    }
}

fn drive<T: Send + 'static>(
    connector: Arc<dyn Connector>,
    url: StreamResult<Url>,
    request: RequestDescriptor<T>,
    config: StreamConfig,
) -> impl Stream<Item = StreamItem<T>> + Send + 'static {
    stream! {
        let operation = request.operation.name().to_string();

        let url = match url {
            Ok(url) => url,
            Err(e) => {
                warn!(%operation, error = %e, "Could not resolve streaming URL");
                yield Err(e);
                return;
            }
        };

        if request.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
            debug!(%operation, "Cancelled before the connection was opened");
            if let Some(item) = cancelled(config.cancellation_policy) {
                yield item;
            }
            return;
        }

        let opened = match &request.cancellation {
            Some(token) => tokio::select! {
                biased;

                () = token.cancelled() => None,
                result = ConnectionHandle::open(connector.as_ref(), &url) => Some(result),
            },
            None => Some(ConnectionHandle::open(connector.as_ref(), &url).await),
        };

        let mut handle = match opened {
            Some(Ok(handle)) => handle,
            Some(Err(e)) => {
                warn!(%operation, error = %e, "Connection failed");
                let reinterpreted = match &e {
                    StreamError::Rejected { status, body, .. } => {
                        request.decoder.decode_rejection(*status, body)
                    }
                    _ => None,
                };
                yield reinterpreted.unwrap_or(Err(e));
                return;
            }
            None => {
                debug!(%operation, "Cancelled while the connection was opening");
                if let Some(item) = cancelled(config.cancellation_policy) {
                    yield item;
                }
                return;
            }
        };

        let subscription = match &request.cancellation {
            Some(token) => subscribe(token, &mut handle),
            None => Subscription::Inactive,
        };
        if subscription == Subscription::ClosedImmediately {
            if let Some(item) = cancelled(config.cancellation_policy) {
                yield item;
            }
            return;
        }

        loop {
            match handle.next().await {
                Delivery::Frame(frame) => match request.decoder.decode(&frame) {
                    Ok(value) => yield Ok(value),
                    Err(e) if e.is_decode() && config.decode_policy == DecodePolicy::Skip => {
                        warn!(%operation, error = %e, "Skipping frame that failed to decode");
                    }
                    Err(e) => {
                        handle.close(CloseCause::DecodeFailed);
                        yield Err(e);
                        break;
                    }
                },
                Delivery::Closed(CloseCause::Cancelled) => {
                    if let Some(item) = cancelled(config.cancellation_policy) {
                        yield item;
                    }
                    break;
                }
                Delivery::Closed(cause) => {
                    debug!(%operation, %cause, "Stream ended");
                    break;
                }
                Delivery::Failed(e) => {
                    yield Err(e);
                    break;
                }
            }
        }

        handle.close(CloseCause::Finished);
    }
}
