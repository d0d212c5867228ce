//! Header names used by the S3 API.

pub(crate) const AUTHORIZATION: &str = "authorization";
pub(crate) const CONTENT_LENGTH: &str = "content-length";
pub(crate) const CONTENT_TYPE: &str = "content-type";
pub(crate) const ETAG: &str = "etag";
pub(crate) const HOST: &str = "host";
pub(crate) const LAST_MODIFIED: &str = "last-modified";
pub(crate) const RANGE: &str = "range";
pub(crate) const USER_AGENT: &str = "user-agent";
pub(crate) const X_AMZ_ACL: &str = "x-amz-acl";
pub(crate) const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";
pub(crate) const X_AMZ_DATE: &str = "x-amz-date";
