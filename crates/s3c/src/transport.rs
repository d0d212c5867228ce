//! The HTTP transport seam.
//!
//! The client signs fully materialized requests and hands them to a
//! [`Transport`]. The default transport wraps [`reqwest`]; tests and
//! embedders can substitute their own implementation.

use crate::error::StdError;
use crate::stream::DynByteStream;

use std::fmt;

use bytes::Bytes;
use futures::StreamExt;
use futures::TryStreamExt;
use http::HeaderMap;
use http::Method;
use http::StatusCode;

/// A signed HTTP request ready to go on the wire.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including the canonicalized query string.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// An HTTP response with a streaming body.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: DynByteStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Transport-level I/O failure, surfaced verbatim to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub StdError);

/// Issues one HTTP request at a time on behalf of the client.
///
/// Connection pooling, TLS, and timeouts are the transport's concern; the
/// client imposes none of its own.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn roundtrip(&self, req: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a pre-configured [`reqwest::Client`] (proxies, timeouts, ...).
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn roundtrip(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .request(req.method, req.url)
            .headers(req.headers)
            .body(req.body)
            .send()
            .await
            .map_err(|e| TransportError(Box::new(e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(|e| -> StdError { Box::new(e) }).boxed();

        Ok(HttpResponse { status, headers, body })
    }
}
