//! XML payloads of the S3 REST API.
//!
//! Parsers take a fully concatenated body and return typed records; every
//! decode failure of a success body surfaces as
//! [`Error::Decode`](crate::Error::Decode). Non-2xx bodies go through
//! [`error_from_response`], which falls back to
//! [`Error::UnexpectedStatus`](crate::Error::UnexpectedStatus) when the body
//! is not an S3 `<Error>` document.

use crate::error::{Error, S3Result, ServerError};
use crate::types::{BucketInfo, ListEntry, ObjectInfo, Timestamp, UploadInfo, trim_etag};

use http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> S3Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| Error::Decode(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| Error::Decode(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> S3Result<String> {
    quick_xml::se::to_string(value).map_err(|e| Error::Decode(e.to_string()))
}

// ---------------------------------------------------------------- errors

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorXml {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

fn body_snippet(body: &[u8]) -> String {
    let end = body.len().min(256);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

/// Translates a non-2xx response into a typed error.
///
/// `HEAD` replies carry no body; well-known statuses are mapped onto
/// synthesized error codes so callers see the same shape either way.
pub(crate) fn error_from_response(
    status: StatusCode,
    body: &[u8],
    bucket: Option<&str>,
    object: Option<&str>,
) -> Error {
    if body.is_empty() {
        let synthesized = match status {
            StatusCode::NOT_FOUND => Some(("NotFound", "Not Found")),
            StatusCode::FORBIDDEN => Some(("AccessDenied", "Valid and authorized credentials required")),
            StatusCode::MOVED_PERMANENTLY => Some(("MovedPermanently", "Moved Permanently")),
            StatusCode::CONFLICT => Some(("Conflict", "Conflict")),
            _ => None,
        };
        if let Some((code, message)) = synthesized {
            return Error::Server(ServerError {
                code: code.to_owned(),
                message: message.to_owned(),
                request_id: None,
                resource: None,
                status: Some(status),
                bucket: bucket.map(str::to_owned),
                object: object.map(str::to_owned),
            });
        }
        return Error::UnexpectedStatus {
            status,
            body_snippet: String::new(),
        };
    }

    match decode::<ErrorXml>(body) {
        Ok(e) if !e.code.is_empty() => Error::Server(ServerError {
            code: e.code,
            message: e.message,
            request_id: e.request_id,
            resource: e.resource,
            status: Some(status),
            bucket: bucket.map(str::to_owned),
            object: object.map(str::to_owned),
        }),
        _ => Error::UnexpectedStatus {
            status,
            body_snippet: body_snippet(body),
        },
    }
}

// --------------------------------------------------------------- buckets

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListAllMyBucketsResult {
    #[serde(default)]
    buckets: Buckets,
}

#[derive(Debug, Default, Deserialize)]
struct Buckets {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BucketXml {
    name: String,
    creation_date: Timestamp,
}

pub(crate) fn parse_list_buckets(body: &[u8]) -> S3Result<Vec<BucketInfo>> {
    let result: ListAllMyBucketsResult = decode(body)?;
    Ok(result
        .buckets
        .bucket
        .into_iter()
        .map(|b| BucketInfo {
            name: b.name,
            creation_date: b.creation_date,
        })
        .collect())
}

// --------------------------------------------------------------- objects

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_marker: Option<String>,
    #[serde(default)]
    contents: Vec<ContentsXml>,
    #[serde(default)]
    common_prefixes: Vec<CommonPrefixXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentsXml {
    key: String,
    last_modified: Timestamp,
    #[serde(rename = "ETag", default)]
    etag: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonPrefixXml {
    prefix: String,
}

/// One page of an object listing.
#[derive(Debug)]
pub(crate) struct ObjectsPage {
    pub(crate) entries: Vec<ListEntry>,
    pub(crate) is_truncated: bool,
    pub(crate) next_marker: Option<String>,
}

pub(crate) fn parse_list_objects(body: &[u8]) -> S3Result<ObjectsPage> {
    let result: ListBucketResult = decode(body)?;
    let mut entries = Vec::with_capacity(result.contents.len() + result.common_prefixes.len());
    for object in result.contents {
        entries.push(ListEntry::Object(ObjectInfo {
            key: object.key,
            last_modified: object.last_modified,
            etag: trim_etag(&object.etag),
            size: object.size,
        }));
    }
    for prefix in result.common_prefixes {
        entries.push(ListEntry::CommonPrefix(prefix.prefix));
    }
    Ok(ObjectsPage {
        entries,
        is_truncated: result.is_truncated,
        next_marker: result.next_marker,
    })
}

// ------------------------------------------------------------- multipart

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListMultipartUploadsResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_key_marker: Option<String>,
    #[serde(default)]
    next_upload_id_marker: Option<String>,
    #[serde(rename = "Upload", default)]
    upload: Vec<UploadXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadXml {
    key: String,
    upload_id: String,
    initiated: Timestamp,
}

/// One page of an in-progress multipart upload listing.
#[derive(Debug)]
pub(crate) struct UploadsPage {
    pub(crate) uploads: Vec<UploadInfo>,
    pub(crate) is_truncated: bool,
    pub(crate) next_key_marker: Option<String>,
    pub(crate) next_upload_id_marker: Option<String>,
}

pub(crate) fn parse_list_uploads(body: &[u8]) -> S3Result<UploadsPage> {
    let result: ListMultipartUploadsResult = decode(body)?;
    Ok(UploadsPage {
        uploads: result
            .upload
            .into_iter()
            .map(|u| UploadInfo {
                key: u.key,
                upload_id: u.upload_id,
                initiated: u.initiated,
            })
            .collect(),
        is_truncated: result.is_truncated,
        next_key_marker: result.next_key_marker,
        next_upload_id_marker: result.next_upload_id_marker,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListPartsResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_part_number_marker: Option<u16>,
    #[serde(rename = "Part", default)]
    part: Vec<PartXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PartXml {
    part_number: u16,
    #[serde(rename = "ETag", default)]
    etag: String,
    size: u64,
}

/// A part already present on the server.
#[derive(Debug, Clone)]
pub(crate) struct PartInfo {
    pub(crate) part_number: u16,
    /// ETag with the surrounding quotes stripped.
    pub(crate) etag: String,
    pub(crate) size: u64,
}

/// One page of a part listing.
#[derive(Debug)]
pub(crate) struct PartsPage {
    pub(crate) parts: Vec<PartInfo>,
    pub(crate) is_truncated: bool,
    pub(crate) next_part_number_marker: Option<u16>,
}

pub(crate) fn parse_list_parts(body: &[u8]) -> S3Result<PartsPage> {
    let result: ListPartsResult = decode(body)?;
    Ok(PartsPage {
        parts: result
            .part
            .into_iter()
            .map(|p| PartInfo {
                part_number: p.part_number,
                etag: trim_etag(&p.etag),
                size: p.size,
            })
            .collect(),
        is_truncated: result.is_truncated,
        next_part_number_marker: result.next_part_number_marker,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateMultipartUploadResult {
    upload_id: String,
}

pub(crate) fn parse_initiate_multipart(body: &[u8]) -> S3Result<String> {
    let result: InitiateMultipartUploadResult = decode(body)?;
    Ok(result.upload_id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CompleteMultipartUploadResult {
    #[serde(rename = "ETag", default)]
    etag: String,
}

/// Returns the final object ETag from a Complete Multipart Upload reply.
pub(crate) fn parse_complete_multipart(body: &[u8]) -> S3Result<String> {
    let result: CompleteMultipartUploadResult = decode(body)?;
    Ok(trim_etag(&result.etag))
}

#[derive(Debug, Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
struct CompleteMultipartUploadXml {
    #[serde(rename = "Part")]
    part: Vec<CompletedPartXml>,
}

#[derive(Debug, Serialize)]
struct CompletedPartXml {
    #[serde(rename = "PartNumber")]
    part_number: u16,
    #[serde(rename = "ETag")]
    etag: String,
}

/// Body of a Complete Multipart Upload request; parts must already be in
/// ascending part-number order.
pub(crate) fn complete_multipart_body(parts: &[(u16, String)]) -> S3Result<String> {
    let doc = CompleteMultipartUploadXml {
        part: parts
            .iter()
            .map(|(part_number, etag)| CompletedPartXml {
                part_number: *part_number,
                etag: etag.clone(),
            })
            .collect(),
    };
    encode(&doc)
}

// ---------------------------------------------------------------- region

#[derive(Debug, Deserialize)]
struct LocationConstraintXml {
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

/// Extracts `LocationConstraint`; an empty element or body means the
/// default region.
pub(crate) fn parse_location(body: &[u8]) -> S3Result<String> {
    if body.is_empty() {
        return Ok(crate::region::DEFAULT_REGION.to_owned());
    }
    let result: LocationConstraintXml = decode(body)?;
    match result.text {
        Some(region) if !region.is_empty() => Ok(region),
        _ => Ok(crate::region::DEFAULT_REGION.to_owned()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "CreateBucketConfiguration")]
struct CreateBucketConfigurationXml {
    #[serde(rename = "LocationConstraint")]
    location_constraint: String,
}

pub(crate) fn create_bucket_config_body(region: &str) -> S3Result<String> {
    encode(&CreateBucketConfigurationXml {
        location_constraint: region.to_owned(),
    })
}

// ------------------------------------------------------------------- acl

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccessControlPolicyXml {
    #[serde(default)]
    access_control_list: AccessControlListXml,
}

#[derive(Debug, Default, Deserialize)]
struct AccessControlListXml {
    #[serde(rename = "Grant", default)]
    grant: Vec<GrantXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GrantXml {
    #[serde(default)]
    grantee: Option<GranteeXml>,
    #[serde(default)]
    permission: String,
}

#[derive(Debug, Deserialize)]
struct GranteeXml {
    #[serde(rename = "URI", default)]
    uri: Option<String>,
}

/// One grant of a bucket ACL document.
#[derive(Debug, Clone)]
pub(crate) struct AclGrant {
    pub(crate) grantee_uri: Option<String>,
    pub(crate) permission: String,
}

pub(crate) fn parse_acl(body: &[u8]) -> S3Result<Vec<AclGrant>> {
    let result: AccessControlPolicyXml = decode(body)?;
    Ok(result
        .access_control_list
        .grant
        .into_iter()
        .map(|g| AclGrant {
            grantee_uri: g.grantee.and_then(|grantee| grantee.uri),
            permission: g.permission,
        })
        .collect())
}
