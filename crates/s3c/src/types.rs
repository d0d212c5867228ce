//! Caller-visible records.

use crate::error::Error;
use crate::stream::DynByteStream;

use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// See <https://github.com/time-rs/time/issues/498>
const RFC1123: &[FormatItem<'_>] =
    format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");

/// A point in time as it appears in S3 XML documents and HTTP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Parses an ISO 8601 / RFC 3339 timestamp (S3 XML documents).
    pub(crate) fn parse_iso8601(s: &str) -> Result<Self, time::error::Parse> {
        Ok(Self(OffsetDateTime::parse(s, &Rfc3339)?))
    }

    /// Parses an HTTP date (`Last-Modified` and friends).
    pub(crate) fn parse_http_date(s: &str) -> Result<Self, time::error::Parse> {
        Ok(Self(PrimitiveDateTime::parse(s, RFC1123)?.assume_utc()))
    }

    /// Renders the timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        let t = self.0;
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            t.year(),
            u8::from(t.month()),
            t.day(),
            t.hour(),
            t.minute(),
            t.second(),
            t.millisecond()
        )
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl serde::Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::Deserialize as _;
        use serde::de::Error as _;
        let s = String::deserialize(deserializer)?;
        Self::parse_iso8601(&s).map_err(D::Error::custom)
    }
}

/// A bucket as listed by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: Timestamp,
}

/// An object as listed by `GET /{bucket}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub last_modified: Timestamp,
    /// ETag with the surrounding quotes stripped.
    pub etag: String,
    pub size: u64,
}

/// One record of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Object(ObjectInfo),
    /// A key prefix grouped by the delimiter in non-recursive listings.
    CommonPrefix(String),
}

/// Metadata of a single object, from `HEAD /{bucket}/{key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    /// ETag with the surrounding quotes stripped.
    pub etag: String,
    pub content_type: Option<String>,
    pub last_modified: Option<Timestamp>,
}

/// An in-progress multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub key: String,
    pub upload_id: String,
    pub initiated: Timestamp,
}

/// Response of a GET object call.
///
/// The body must be fully consumed or dropped so the underlying connection
/// can be reused.
pub struct ObjectContent {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    /// ETag with the surrounding quotes stripped.
    pub etag: Option<String>,
    pub last_modified: Option<Timestamp>,
    pub body: DynByteStream,
}

impl fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContent")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

/// Canned access control policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl CannedAcl {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            other => Err(invalid_argument!("unknown canned acl: {other:?}")),
        }
    }
}

/// Strips the quotes S3 puts around ETag values.
pub(crate) fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Timestamp::parse_iso8601("2013-05-24T00:00:00.000Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2013-05-24T00:00:00.000Z");
    }

    #[test]
    fn test_timestamp_http_date() {
        let ts = Timestamp::parse_http_date("Fri, 24 May 2013 00:00:00 GMT").unwrap();
        assert_eq!(ts.to_iso8601(), "2013-05-24T00:00:00.000Z");
    }

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::parse_iso8601("2013-05-24T00:00:00.000Z").unwrap();
        let b = Timestamp::parse_iso8601("2013-05-24T00:00:01.000Z").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_canned_acl_parse() {
        assert_eq!("private".parse::<CannedAcl>().unwrap(), CannedAcl::Private);
        assert_eq!(
            "public-read-write".parse::<CannedAcl>().unwrap(),
            CannedAcl::PublicReadWrite
        );
        assert!("PRIVATE".parse::<CannedAcl>().is_err());
    }

    #[test]
    fn test_trim_etag() {
        assert_eq!(trim_etag("\"abc123\""), "abc123");
        assert_eq!(trim_etag("abc123"), "abc123");
    }
}
