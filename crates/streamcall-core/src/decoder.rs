//! Frame decoders.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::{StreamError, StreamResult};
use crate::frame::Frame;

/// Turns one inbound frame into one stream item.
///
/// Any error returned ends the stream; under
/// [`DecodePolicy::Skip`](crate::DecodePolicy::Skip) only
/// [`StreamError::Decode`] errors are passed over.
pub trait Decoder<T>: Send + Sync {
    /// Decode a single frame.
    fn decode(&self, frame: &Frame) -> StreamResult<T>;

    /// Interpret an HTTP response that refused the upgrade.
    ///
    /// Returning `Some` replaces the [`StreamError::Rejected`] error as the
    /// stream's only item. The default keeps the error.
    fn decode_rejection(&self, status: u16, body: &str) -> Option<StreamResult<T>> {
        let _ = (status, body);
        None
    }
}

/// Decodes each frame as one JSON document. The default decoder.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    /// Create a JSON decoder.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Decoder<T> for JsonDecoder<T> {
    fn decode(&self, frame: &Frame) -> StreamResult<T> {
        let payload = frame.as_bytes();
        serde_json::from_slice(payload).map_err(|e| StreamError::decode(e, payload))
    }
}

/// Adapts a closure into a [`Decoder`]. Built with [`decoder_fn`].
#[derive(Clone)]
pub struct FnDecoder<F> {
    f: F,
}

impl<F> fmt::Debug for FnDecoder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDecoder").finish_non_exhaustive()
    }
}

impl<T, F> Decoder<T> for FnDecoder<F>
where
    F: Fn(&Frame) -> StreamResult<T> + Send + Sync,
{
    fn decode(&self, frame: &Frame) -> StreamResult<T> {
        (self.f)(frame)
    }
}

/// Wrap a closure as a decoder override.
///
/// ```rust,ignore
/// let upper = decoder_fn(|frame: &Frame| Ok(String::from_utf8_lossy(frame.as_bytes()).to_uppercase()));
/// ```
pub fn decoder_fn<T, F>(f: F) -> FnDecoder<F>
where
    F: Fn(&Frame) -> StreamResult<T> + Send + Sync,
{
    FnDecoder { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_json_decoder_text_and_binary() {
        let decoder = JsonDecoder::<Point>::new();
        assert_eq!(
            decoder.decode(&Frame::from(r#"{"x":1,"y":2}"#)).unwrap(),
            Point { x: 1, y: 2 }
        );
        assert_eq!(
            decoder
                .decode(&Frame::Binary(Bytes::from_static(br#"{"x":3,"y":4}"#)))
                .unwrap(),
            Point { x: 3, y: 4 }
        );
    }

    #[test]
    fn test_json_decoder_scalar_frames() {
        let decoder = JsonDecoder::<u32>::new();
        assert_eq!(decoder.decode(&Frame::from("1")).unwrap(), 1);
    }

    #[test]
    fn test_json_decoder_rejects_malformed() {
        let decoder = JsonDecoder::<Point>::new();
        let err = decoder.decode(&Frame::from("{not json")).unwrap_err();
        match err {
            StreamError::Decode {
                payload_preview, ..
            } => assert_eq!(payload_preview, "{not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejection_kept_by_default() {
        let decoder = JsonDecoder::<Point>::new();
        assert!(decoder.decode_rejection(404, "{}").is_none());
    }

    #[test]
    fn test_fn_decoder() {
        let decoder = decoder_fn(|frame: &Frame| Ok(frame.len()));
        assert_eq!(decoder.decode(&Frame::from("abc")).unwrap(), 3);
    }
}
