//! Addressing, escaping and signature-shape checks against a mock
//! transport.

mod common;

use common::{MockResponse, MockTransport};

use s3c::Client;

fn hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_path_style_request_line() {
    let transport = MockTransport::new(|_| {
        MockResponse::ok(Vec::new())
            .with_header("content-length", "11")
            .with_header("etag", "\"abc\"")
    });
    let client = Client::with_transport("http://play.example.com:9000", "ak", "sk", transport.clone()).unwrap();

    client.stat_object("mybucket", "some key.txt").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, http::Method::HEAD);
    assert_eq!(requests[0].url, "http://play.example.com:9000/mybucket/some%20key.txt");
    assert_eq!(requests[0].header("host"), Some("play.example.com:9000"));
}

#[tokio::test]
async fn test_virtual_style_bucket_in_host_only() {
    let transport = MockTransport::new(|req| {
        if req.url.contains("location") {
            MockResponse::ok(&b"<LocationConstraint/>"[..])
        } else {
            MockResponse::ok(Vec::new()).with_header("content-length", "0")
        }
    });
    let client = Client::with_transport("https://s3.amazonaws.com", "ak", "sk", transport.clone()).unwrap();

    client.stat_object("mybucket", "test.txt").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    // region bootstrap, then the HEAD itself
    assert_eq!(requests[0].url, "https://mybucket.s3.amazonaws.com/?location");
    assert_eq!(requests[1].url, "https://mybucket.s3.amazonaws.com/test.txt");
    assert_eq!(requests[1].header("host"), Some("mybucket.s3.amazonaws.com"));
}

#[tokio::test]
async fn test_authorization_header_shape() {
    let transport = MockTransport::new(|_| MockResponse::ok(Vec::new()).with_header("content-length", "0"));
    let client = Client::with_transport("http://play.example.com:9000", "ak", "sk", transport.clone()).unwrap();

    client.stat_object("mybucket", "test.txt").await.unwrap();

    let requests = transport.requests();
    let authorization = requests[0].header("authorization").unwrap();

    let rest = authorization.strip_prefix("AWS4-HMAC-SHA256 Credential=ak/").unwrap();
    let (scope, rest) = rest.split_once(", SignedHeaders=").unwrap();
    assert!(scope.ends_with("/us-east-1/s3/aws4_request"));
    let (signed_headers, signature) = rest.split_once(", Signature=").unwrap();
    assert!(signed_headers.split(';').any(|h| h == "host"));
    assert!(signed_headers.split(';').any(|h| h == "x-amz-date"));
    assert!(signed_headers.split(';').any(|h| h == "x-amz-content-sha256"));
    assert!(hex64(signature));

    assert!(requests[0].header("x-amz-date").is_some());
    assert!(requests[0].header("x-amz-content-sha256").is_some());
    assert!(requests[0].header("user-agent").unwrap().starts_with("Minio ("));
}

#[tokio::test]
async fn test_presigned_get_object_structure() {
    let transport = MockTransport::new(|_| MockResponse::ok(Vec::new()));
    let client = Client::with_transport("http://play.example.com:9000", "ak", "sk", transport.clone()).unwrap();

    let url = client.presigned_get_object("mybucket", "some key.txt", 86_400).await.unwrap();

    assert!(url.starts_with("http://play.example.com:9000/mybucket/some%20key.txt?"));
    assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
    assert!(url.contains("X-Amz-Expires=86400"));
    assert!(url.contains("X-Amz-SignedHeaders=host"));
    assert!(url.contains("X-Amz-Credential=ak%2F"));

    let signature = url.split("X-Amz-Signature=").nth(1).unwrap();
    let signature = signature.split('&').next().unwrap();
    assert!(hex64(signature));

    // pre-signing never touches the network
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_presigned_expiry_bounds() {
    let transport = MockTransport::new(|_| MockResponse::ok(Vec::new()));
    let client = Client::with_transport("http://play.example.com:9000", "ak", "sk", transport).unwrap();

    assert!(matches!(
        client.presigned_get_object("mybucket", "k", 0).await,
        Err(s3c::Error::InvalidArgument(_))
    ));
    assert!(matches!(
        client.presigned_put_object("mybucket", "k", 604_801).await,
        Err(s3c::Error::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_escaped_key_round_trips() {
    let transport = MockTransport::new(|_| MockResponse::ok(Vec::new()).with_header("content-length", "0"));
    let client = Client::with_transport("http://play.example.com:9000", "ak", "sk", transport.clone()).unwrap();

    let key = "weird !*'();:@&=+$,?#[]%.bin";
    client.stat_object("mybucket", key).await.unwrap();

    let url = &transport.requests()[0].url;
    let path = url.strip_prefix("http://play.example.com:9000/mybucket/").unwrap();
    assert_eq!(urlencoding::decode(path).unwrap(), key);
}
