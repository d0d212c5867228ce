//! Request descriptors and URL construction.
//!
//! An [`S3Request`] carries the logical parts of a call: method, bucket,
//! object key, query parameters, extra headers, and payload. [`build`]
//! turns it into an addressed request, applying path-style or
//! virtual-host-style rules and resource escaping. The result is immutable
//! once handed to the signer.

use crate::endpoint::Endpoint;
use crate::error::S3Result;
use crate::header;

use bytes::Bytes;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;

/// Percent-encodes every byte except unreserved `A-Z a-z 0-9 - _ . ~`.
pub(crate) fn uri_escape(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Escapes an object key for use in a URI path, preserving `/`.
pub(crate) fn escape_object_key(key: &str) -> String {
    key.split('/').map(uri_escape).collect::<Vec<_>>().join("/")
}

/// Ordered query-string parameters.
///
/// Values are stored raw; escaping and lexicographic ordering happen when
/// the query is rendered.
#[derive(Debug, Default, Clone)]
pub(crate) struct Query {
    pairs: Vec<(String, Option<String>)>,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), Some(value.into())));
    }

    /// Adds a valueless token such as `uploads` or `location`.
    pub(crate) fn add_flag(&mut self, key: impl Into<String>) {
        self.pairs.push((key.into(), None));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Escaped, sorted `k` / `k=v` tokens for the request URL.
    pub(crate) fn to_url_query(&self) -> String {
        let mut tokens: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{}={}", uri_escape(k), uri_escape(v)),
                None => uri_escape(k),
            })
            .collect();
        tokens.sort_unstable();
        tokens.join("&")
    }

    /// SigV4 canonical form: escaped, sorted, and every key carries `=`.
    pub(crate) fn to_canonical(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .map(|(k, v)| (uri_escape(k), v.as_deref().map(uri_escape).unwrap_or_default()))
            .collect();
        pairs.sort_unstable();
        let tokens: Vec<String> = pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        tokens.join("&")
    }
}

/// A logical S3 request before addressing and signing.
#[derive(Debug)]
pub(crate) struct S3Request {
    pub(crate) method: Method,
    pub(crate) bucket: Option<String>,
    pub(crate) object: Option<String>,
    pub(crate) query: Query,
    pub(crate) headers: HeaderMap,
    pub(crate) payload: Bytes,
}

impl S3Request {
    pub(crate) fn new(method: Method) -> Self {
        Self {
            method,
            bucket: None,
            object: None,
            query: Query::new(),
            headers: HeaderMap::new(),
            payload: Bytes::new(),
        }
    }

    pub(crate) fn bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_owned());
        self
    }

    pub(crate) fn object(mut self, key: &str) -> Self {
        self.object = Some(key.to_owned());
        self
    }

    pub(crate) fn query(mut self, key: &str, value: &str) -> Self {
        self.query.add(key, value);
        self
    }

    pub(crate) fn query_flag(mut self, key: &str) -> Self {
        self.query.add_flag(key);
        self
    }

    /// # Errors
    /// Returns `InvalidArgument` when the value is not a legal header value.
    pub(crate) fn header(mut self, name: &'static str, value: &str) -> S3Result<Self> {
        insert_header(&mut self.headers, name, value)?;
        Ok(self)
    }

    pub(crate) fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }
}

/// A fully addressed request, ready for the signer and the transport.
#[derive(Debug)]
pub(crate) struct BuiltRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    /// Escaped URI path, as used in the canonical request.
    pub(crate) uri_path: String,
    pub(crate) query: Query,
    pub(crate) headers: HeaderMap,
    pub(crate) payload: Bytes,
}

/// Applies the endpoint's addressing rules and the standing headers.
pub(crate) fn build(endpoint: &Endpoint, req: S3Request, user_agent: &str) -> S3Result<BuiltRequest> {
    let escaped_object = req.object.as_deref().map(escape_object_key);
    let bucket = req.bucket.as_deref();

    let uri_path = endpoint.uri_path_for(bucket, escaped_object.as_deref());
    let authority = endpoint.authority_for(bucket);

    let mut url = format!("{}://{}{}", endpoint.scheme().as_str(), authority, uri_path);
    if !req.query.is_empty() {
        url.push('?');
        url.push_str(&req.query.to_url_query());
    }

    let mut headers = req.headers;
    insert_header(&mut headers, header::HOST, &authority)?;
    insert_header(&mut headers, header::USER_AGENT, user_agent)?;

    Ok(BuiltRequest {
        method: req.method,
        url,
        uri_path,
        query: req.query,
        headers,
        payload: req.payload,
    })
}

pub(crate) fn insert_header(map: &mut HeaderMap, name: &'static str, value: &str) -> S3Result<()> {
    let value =
        HeaderValue::from_str(value).map_err(|_| invalid_argument!("invalid value for header {name}: {value:?}"))?;
    map.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_escape_special_characters() {
        assert_eq!(uri_escape("some key.txt"), "some%20key.txt");
        assert_eq!(uri_escape("a+b"), "a%2Bb");
        assert_eq!(uri_escape("a/b"), "a%2Fb");
        assert_eq!(uri_escape("!*'()"), "%21%2A%27%28%29");
        assert_eq!(uri_escape("safe-chars_09.~"), "safe-chars_09.~");
    }

    #[test]
    fn test_escape_object_key_preserves_slash() {
        assert_eq!(escape_object_key("dir/some key.txt"), "dir/some%20key.txt");
        assert_eq!(escape_object_key("a;b/c@d"), "a%3Bb/c%40d");
    }

    #[test]
    fn test_escape_round_trips() {
        let key = "! * ' ( ) ; : @ & = + $ , / ? # [ ] %";
        let escaped = escape_object_key(key);
        let decoded = urlencoding::decode(&escaped).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_query_rendering() {
        let mut q = Query::new();
        q.add("prefix", "photos/");
        q.add_flag("uploads");
        q.add("max-keys", "1000");
        assert_eq!(q.to_url_query(), "max-keys=1000&prefix=photos%2F&uploads");
        assert_eq!(q.to_canonical(), "max-keys=1000&prefix=photos%2F&uploads=");
    }

    #[test]
    fn test_build_path_style() {
        let ep = Endpoint::parse("http://play.example.com:9000").unwrap();
        let req = S3Request::new(Method::GET).bucket("mybucket").object("some key.txt");
        let built = build(&ep, req, "test-agent").unwrap();
        assert_eq!(built.url, "http://play.example.com:9000/mybucket/some%20key.txt");
        assert_eq!(built.uri_path, "/mybucket/some%20key.txt");
        assert_eq!(built.headers.get("host").unwrap(), "play.example.com:9000");
    }

    #[test]
    fn test_build_virtual_style() {
        let ep = Endpoint::parse("https://s3.amazonaws.com").unwrap();
        let req = S3Request::new(Method::GET).bucket("mybucket").object("test.txt");
        let built = build(&ep, req, "test-agent").unwrap();
        assert_eq!(built.url, "https://mybucket.s3.amazonaws.com/test.txt");
        assert_eq!(built.headers.get("host").unwrap(), "mybucket.s3.amazonaws.com");
    }
}
