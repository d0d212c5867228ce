//! Byte stream utilities for the response pipeline.

use crate::error::{Error, S3Result, StdError};
use crate::transport::TransportError;

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;

/// Boxed byte stream handed to callers and produced by transports.
pub type DynByteStream = futures::stream::BoxStream<'static, Result<Bytes, StdError>>;

/// Bound for error documents and XML metadata bodies; they are never large.
pub(crate) const MAX_XML_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Collects a byte stream into one buffer, failing past `limit` bytes.
pub(crate) async fn aggregate_limited<S>(mut stream: S, limit: usize) -> S3Result<Vec<u8>>
where
    S: Stream<Item = Result<Bytes, StdError>> + Unpin,
{
    let mut buf = Vec::new();
    while let Some(next) = stream.next().await {
        let chunk = next.map_err(|e| Error::Network(TransportError(e)))?;
        if buf.len().saturating_add(chunk.len()) > limit {
            return Err(Error::Decode(format!("response body exceeds {limit} bytes")));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Consumes and discards the rest of a stream so the underlying connection
/// can go back to the pool.
pub(crate) async fn drain<S>(mut stream: S)
where
    S: Stream + Unpin,
{
    while stream.next().await.is_some() {}
}

pin_project_lite::pin_project! {
    /// Passes bytes through unchanged, failing when the observed count
    /// diverges from the declared size: immediately once it is exceeded,
    /// or at end-of-stream when it falls short.
    pub(crate) struct SizeGuard<S> {
        #[pin]
        inner: S,
        expected: u64,
        seen: u64,
        finished: bool,
    }
}

impl<S> SizeGuard<S> {
    pub(crate) fn new(inner: S, expected: u64) -> Self {
        Self {
            inner,
            expected,
            seen: 0,
            finished: false,
        }
    }
}

impl<S> Stream for SizeGuard<S>
where
    S: Stream<Item = Result<Bytes, StdError>>,
{
    type Item = S3Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }
        match this.inner.poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                *this.seen += chunk.len() as u64;
                if *this.seen > *this.expected {
                    *this.finished = true;
                    Poll::Ready(Some(Err(Error::SizeMismatch {
                        expected: *this.expected,
                        actual: *this.seen,
                    })))
                } else {
                    Poll::Ready(Some(Ok(chunk)))
                }
            }
            Poll::Ready(Some(Err(e))) => {
                *this.finished = true;
                Poll::Ready(Some(Err(Error::Network(TransportError(e)))))
            }
            Poll::Ready(None) => {
                *this.finished = true;
                if *this.seen == *this.expected {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Err(Error::SizeMismatch {
                        expected: *this.expected,
                        actual: *this.seen,
                    })))
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, StdError>> + Unpin {
        futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    #[tokio::test]
    async fn test_aggregate_within_limit() {
        let s = byte_stream(vec![b"hello ", b"world"]);
        let buf = aggregate_limited(s, 64).await.unwrap();
        assert_eq!(buf, b"hello world");
    }

    #[tokio::test]
    async fn test_aggregate_over_limit() {
        let s = byte_stream(vec![b"hello ", b"world"]);
        let err = aggregate_limited(s, 8).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_size_guard_exact() {
        let s = SizeGuard::new(byte_stream(vec![b"abc", b"de"]), 5);
        let chunks: Vec<_> = s.collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_size_guard_short() {
        let s = SizeGuard::new(byte_stream(vec![b"abc"]), 5);
        let chunks: Vec<_> = s.collect().await;
        assert!(matches!(
            chunks.last(),
            Some(Err(Error::SizeMismatch { expected: 5, actual: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_size_guard_long() {
        let s = SizeGuard::new(byte_stream(vec![b"abc", b"defg"]), 5);
        let chunks: Vec<_> = s.collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(
            chunks.last(),
            Some(Err(Error::SizeMismatch { expected: 5, actual: 7 }))
        ));
    }

    #[tokio::test]
    async fn test_size_guard_stops_after_error() {
        let mut s = SizeGuard::new(byte_stream(vec![b"abcdef"]), 5);
        assert!(matches!(s.next().await, Some(Err(Error::SizeMismatch { .. }))));
        assert!(s.next().await.is_none());
    }
}
