//! Shared mock transport for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use s3c::StdError;
use s3c::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Response the handler hands back for one request.
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

type Handler = Box<dyn Fn(&Recorded) -> MockResponse + Send + Sync>;

/// In-memory transport: records every request and answers via a handler.
pub struct MockTransport {
    requests: Mutex<Vec<Recorded>>,
    handler: Handler,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&Recorded) -> MockResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn roundtrip(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let recorded = Recorded {
            method: req.method.clone(),
            url: req.url.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        };
        let MockResponse { status, headers, body } = (self.handler)(&recorded);
        self.requests.lock().unwrap().push(recorded);

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(&value).expect("mock header value"),
            );
        }

        let chunks = if body.is_empty() {
            Vec::new()
        } else {
            vec![Ok::<_, StdError>(Bytes::from(body))]
        };
        Ok(HttpResponse {
            status: StatusCode::from_u16(status).expect("mock status"),
            headers: header_map,
            body: futures::stream::iter(chunks).boxed(),
        })
    }
}

/// Deterministic payload for upload tests.
pub fn test_content(len: usize) -> Bytes {
    let mut buf = Vec::with_capacity(len);
    for i in 0..len {
        buf.push((i % 251) as u8);
    }
    Bytes::from(buf)
}

/// Splits content into a chunked byte stream like a real transport would.
pub fn chunked_stream(content: Bytes, chunk_size: usize) -> impl futures::Stream<Item = Result<Bytes, StdError>> + Send {
    let mut chunks = Vec::new();
    let mut rest = content;
    while !rest.is_empty() {
        let take = rest.len().min(chunk_size);
        chunks.push(Ok(rest.split_to(take)));
    }
    futures::stream::iter(chunks)
}

pub fn md5_hex(data: &[u8]) -> String {
    use md5::Digest as _;
    hex::encode(md5::Md5::digest(data))
}
