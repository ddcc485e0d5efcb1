//! Request payload descriptors and JSON codec helpers.
//!
//! [`Body`] is what callers hand to the client. It stays materializable so
//! the client can rebuild an identical wire payload on every retry attempt;
//! the one exception is a one-shot byte stream, which is valid for exactly
//! one attempt and makes any retry fail fast with
//! [`Error::NonRetryableBody`](crate::Error::NonRetryableBody).

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{Error, Result};

/// A one-shot stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

enum Inner {
    Empty,
    Bytes(Bytes),
    Json(Bytes),
    Stream(Option<ByteStream>),
}

/// A request payload.
///
/// Construct with [`Body::empty`], [`Body::json`], [`Body::stream`], or any
/// of the `From` impls for strings and byte buffers.
pub struct Body {
    inner: Inner,
}

impl Body {
    /// An empty body.
    #[must_use]
    pub const fn empty() -> Self {
        Self { inner: Inner::Empty }
    }

    /// A pre-serialized byte payload, replayable across retries.
    #[must_use]
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: Inner::Bytes(bytes.into()),
        }
    }

    /// Serialize a value as a JSON payload.
    ///
    /// Serialization happens here, before any network attempt, so encoding
    /// failures never cost a send. The client sets a default
    /// `Content-Type: application/json` for this variant unless the caller
    /// already provided one.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self {
            inner: Inner::Json(to_json(value)?),
        })
    }

    /// A one-shot stream body.
    ///
    /// The stream is consumed by the first attempt and cannot be rewound; if
    /// a retry becomes necessary the call fails with
    /// [`Error::NonRetryableBody`](crate::Error::NonRetryableBody).
    #[must_use]
    pub fn stream(stream: impl Stream<Item = Result<Bytes>> + Send + 'static) -> Self {
        Self {
            inner: Inner::Stream(Some(Box::pin(stream))),
        }
    }

    /// Returns `true` for the empty body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.inner, Inner::Empty)
    }

    /// Returns `true` for a JSON-serialized payload.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.inner, Inner::Json(_))
    }

    /// Produce the wire payload for one attempt.
    ///
    /// Byte and JSON payloads are cheaply cloned for every attempt. A stream
    /// payload is drained exactly once; asking again returns
    /// [`Error::NonRetryableBody`](crate::Error::NonRetryableBody).
    ///
    /// # Errors
    ///
    /// Returns an error if a stream chunk fails or the stream was already
    /// consumed by a previous attempt.
    pub async fn materialize(&mut self) -> Result<Option<Bytes>> {
        match &mut self.inner {
            Inner::Empty => Ok(None),
            Inner::Bytes(bytes) | Inner::Json(bytes) => Ok(Some(bytes.clone())),
            Inner::Stream(slot) => {
                let Some(mut stream) = slot.take() else {
                    return Err(Error::NonRetryableBody);
                };
                let mut collected = Vec::new();
                while let Some(chunk) = stream.next().await {
                    collected.extend_from_slice(&chunk?);
                }
                Ok(Some(Bytes::from(collected)))
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Inner::Empty => f.write_str("Body::Empty"),
            Inner::Bytes(bytes) => f.debug_tuple("Body::Bytes").field(&bytes.len()).finish(),
            Inner::Json(bytes) => f.debug_tuple("Body::Json").field(&bytes.len()).finish(),
            Inner::Stream(Some(_)) => f.write_str("Body::Stream"),
            Inner::Stream(None) => f.write_str("Body::Stream(consumed)"),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::bytes(value)
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Self::bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::bytes(value)
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::bytes(value)
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes with path context on failure.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
/// carrying the JSON path of the failing field.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
