//! Error types surfaced by the client.
//!
//! The variants of [`Error`] are kinds, not sources: every failure the
//! pipeline can produce maps onto exactly one of them. Validation errors
//! are returned before any I/O happens; everything else arrives through
//! the operation's future.

use http::StatusCode;

/// `Result` alias where the error defaults to [`Error`].
pub type S3Result<T, E = Error> = std::result::Result<T, E>;

/// Type-erased error produced by transports and byte streams.
pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Constructs an [`Error::InvalidArgument`](crate::error::Error::InvalidArgument)
/// with a formatted message.
macro_rules! invalid_argument {
    ($($arg:tt)*) => {
        $crate::error::Error::InvalidArgument(format!($($arg)*))
    };
}

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied argument is malformed or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The endpoint URL is not usable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The endpoint scheme is neither `http` nor `https`.
    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    /// Transport-level I/O failure, surfaced verbatim.
    #[error("network error: {0}")]
    Network(#[from] crate::transport::TransportError),

    /// A parsed `<Error>` document from the server.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Non-2xx response whose body is not an S3 error document.
    #[error("unexpected status {status}: {body_snippet:?}")]
    UnexpectedStatus {
        status: StatusCode,
        /// At most the first 256 bytes of the response body.
        body_snippet: String,
    },

    /// An upload stream produced a different number of bytes than declared.
    #[error("size mismatch: expected {expected} bytes, observed {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The server refused the request without an error document.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The bucket carries grants that no canned ACL can express.
    #[error("unsupported acl: {0}")]
    UnsupportedAcl(String),

    /// A success response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A parsed S3 `<Error>` response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("server error: {code}: {message}")]
pub struct ServerError {
    /// Machine-readable error code, e.g. `NoSuchKey`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Request id assigned by the server, if any.
    pub request_id: Option<String>,
    /// Resource the error refers to, if any.
    pub resource: Option<String>,
    /// HTTP status the error document arrived with.
    pub status: Option<StatusCode>,
    /// Bucket the failing operation targeted.
    pub bucket: Option<String>,
    /// Object key the failing operation targeted.
    pub object: Option<String>,
}
