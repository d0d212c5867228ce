//! The S3 client and its operations.
//!
//! Every operation follows the same pipeline: build a request descriptor,
//! resolve the bucket's region, sign, send through the transport, then
//! route the response body into a typed result or error. `put_object`
//! additionally goes through the multipart orchestrator, which re-enters
//! the pipeline once per part.

use crate::credentials::Credentials;
use crate::endpoint::Endpoint;
use crate::error::{Error, S3Result, StdError};
use crate::header;
use crate::list::{ListIncompleteUploads, ListObjects};
use crate::multipart;
use crate::post_policy::{PostForm, PostPolicy, PostPolicyCondition};
use crate::region::{DEFAULT_REGION, RegionCache};
use crate::request::{S3Request, escape_object_key};
use crate::sig_v4;
use crate::sig_v4::AmzDate;
use crate::stream::{MAX_XML_BODY_SIZE, aggregate_limited, drain};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::types::{BucketInfo, CannedAcl, ObjectContent, ObjectStat, Timestamp, trim_etag};
use crate::utils::crypto::hex_sha256;
use crate::validation;
use crate::xml;
use crate::xml::PartInfo;

use std::sync::Arc;
use std::sync::Mutex;

use bytes::Bytes;
use futures::Stream;
use http::{Method, StatusCode};
use time::OffsetDateTime;

/// `User-Agent` prefix; `set_app_info` may append an application token.
const BASE_USER_AGENT: &str = const_str::concat!(
    "Minio (",
    std::env::consts::OS,
    "; ",
    std::env::consts::ARCH,
    ") lib/",
    env!("CARGO_PKG_VERSION")
);

const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
const AUTHENTICATED_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

#[derive(Debug)]
struct UserAgent {
    value: String,
    app_set: bool,
}

/// An S3 client bound to one endpoint and one set of credentials.
///
/// A single instance is safe to share between tasks; the region cache is
/// the only mutable state and lives behind a mutex.
pub struct Client {
    endpoint: Endpoint,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    regions: RegionCache,
    user_agent: Mutex<UserAgent>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the default reqwest transport.
    ///
    /// # Errors
    /// Returns `InvalidEndpoint` / `InvalidProtocol` when the endpoint URL
    /// is not usable.
    pub fn new(endpoint: &str, access_key: &str, secret_key: &str) -> S3Result<Self> {
        Self::with_transport(endpoint, access_key, secret_key, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client on a custom [`Transport`].
    ///
    /// # Errors
    /// Returns `InvalidEndpoint` / `InvalidProtocol` when the endpoint URL
    /// is not usable.
    pub fn with_transport(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        transport: Arc<dyn Transport>,
    ) -> S3Result<Self> {
        Ok(Self {
            endpoint: Endpoint::parse(endpoint)?,
            credentials: Credentials::new(access_key, secret_key),
            transport,
            regions: RegionCache::default(),
            user_agent: Mutex::new(UserAgent {
                value: BASE_USER_AGENT.to_owned(),
                app_set: false,
            }),
        })
    }

    /// Appends ` app/version` to the user agent. Only the first call has an
    /// effect.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when name or version is empty.
    pub fn set_app_info(&self, name: &str, version: &str) -> S3Result<()> {
        if name.is_empty() || version.is_empty() {
            return Err(invalid_argument!("app name and version must not be empty"));
        }
        let mut ua = self.user_agent.lock().unwrap();
        if !ua.app_set {
            ua.value = format!("{} {name}/{version}", ua.value);
            ua.app_set = true;
        }
        Ok(())
    }

    fn user_agent(&self) -> String {
        self.user_agent.lock().unwrap().value.clone()
    }

    // ----------------------------------------------------------- pipeline

    /// Builds, signs and sends a request; no status classification.
    async fn execute(&self, req: S3Request, region: &str) -> S3Result<HttpResponse> {
        let user_agent = self.user_agent();
        let mut built = crate::request::build(&self.endpoint, req, &user_agent)?;

        let payload_hash = hex_sha256(&built.payload);
        let date = AmzDate::now();
        sig_v4::sign_request(
            &mut built.headers,
            &built.method,
            &built.uri_path,
            &built.query,
            &self.credentials,
            region,
            &payload_hash,
            &date,
        )?;

        tracing::debug!(method = %built.method, url = %built.url, "issuing request");
        let response = self
            .transport
            .roundtrip(HttpRequest {
                method: built.method,
                url: built.url,
                headers: built.headers,
                body: built.payload,
            })
            .await?;
        Ok(response)
    }

    /// Sends a request and routes non-accepted statuses into the error
    /// parser. An empty `accept` list admits any 2xx/3xx status.
    async fn execute_checked(
        &self,
        req: S3Request,
        region: &str,
        accept: &[StatusCode],
        bucket: Option<&str>,
        object: Option<&str>,
    ) -> S3Result<HttpResponse> {
        let response = self.execute(req, region).await?;
        let ok = if accept.is_empty() {
            response.status.is_success() || response.status.is_redirection()
        } else {
            accept.contains(&response.status)
        };
        if ok {
            Ok(response)
        } else {
            Err(self.response_error(response, bucket, object).await)
        }
    }

    /// Resolves the region, then issues the request.
    async fn execute_for_bucket(
        &self,
        bucket: &str,
        object: Option<&str>,
        req: S3Request,
        accept: &[StatusCode],
    ) -> S3Result<HttpResponse> {
        let region = self.bucket_region(bucket).await?;
        self.execute_checked(req, &region, accept, Some(bucket), object).await
    }

    /// Consumes the body and turns the response into a typed error.
    async fn response_error(&self, response: HttpResponse, bucket: Option<&str>, object: Option<&str>) -> Error {
        let status = response.status;
        let body = aggregate_limited(response.body, MAX_XML_BODY_SIZE).await.unwrap_or_default();
        xml::error_from_response(status, &body, bucket, object)
    }

    async fn read_body(&self, response: HttpResponse) -> S3Result<Vec<u8>> {
        aggregate_limited(response.body, MAX_XML_BODY_SIZE).await
    }

    // ------------------------------------------------------------- region

    /// Returns the bucket's region, discovering and caching it on first
    /// use. Self-hosted endpoints always resolve to `us-east-1` locally.
    pub(crate) async fn bucket_region(&self, bucket: &str) -> S3Result<String> {
        if !self.endpoint.is_virtual_style() {
            return Ok(DEFAULT_REGION.to_owned());
        }
        if let Some(region) = self.regions.get(bucket) {
            return Ok(region);
        }

        let req = S3Request::new(Method::GET).bucket(bucket).query_flag("location");
        let response = self
            .execute_checked(req, DEFAULT_REGION, &[StatusCode::OK], Some(bucket), None)
            .await?;
        let body = self.read_body(response).await?;
        let region = xml::parse_location(&body)?;
        tracing::debug!(bucket, region = %region, "discovered bucket region");

        self.regions.set(bucket, &region);
        Ok(self.regions.get(bucket).unwrap_or(region))
    }

    // ------------------------------------------------------------ buckets

    /// Creates a bucket. A region other than `us-east-1` is only valid on
    /// the Amazon endpoint and travels as a `CreateBucketConfiguration`
    /// body.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a malformed bucket name, region or
    /// ACL; server errors otherwise.
    pub async fn make_bucket(&self, bucket: &str, region: Option<&str>, acl: Option<CannedAcl>) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        let region = match region {
            Some(region) => {
                validation::check_region(region)?;
                if !self.endpoint.is_virtual_style() && region != DEFAULT_REGION {
                    return Err(invalid_argument!(
                        "regions are only supported on the Amazon endpoint: {region:?}"
                    ));
                }
                region
            }
            None => DEFAULT_REGION,
        };

        let mut req = S3Request::new(Method::PUT).bucket(bucket);
        if let Some(acl) = acl {
            req = req.header(header::X_AMZ_ACL, acl.as_str())?;
        }
        if region != DEFAULT_REGION {
            req = req.payload(Bytes::from(xml::create_bucket_config_body(region)?));
        }

        // Bucket creation always goes through the default region; the
        // target region rides in the body.
        let response = self
            .execute_checked(req, DEFAULT_REGION, &[StatusCode::OK], Some(bucket), None)
            .await?;
        drain(response.body).await;

        // The caller just told us where the bucket lives.
        if self.endpoint.is_virtual_style() {
            self.regions.set(bucket, region);
        }
        Ok(())
    }

    /// Lists all buckets owned by the authenticated principal.
    ///
    /// # Errors
    /// A `TemporaryRedirect` reply is reported as `AccessDenied`; that is
    /// how the server answers an unauthorized listing.
    pub async fn list_buckets(&self) -> S3Result<Vec<BucketInfo>> {
        let req = S3Request::new(Method::GET);
        let response = self.execute(req, DEFAULT_REGION).await?;

        if response.status == StatusCode::TEMPORARY_REDIRECT {
            drain(response.body).await;
            return Err(Error::AccessDenied("valid and authorized credentials required".to_owned()));
        }
        if response.status != StatusCode::OK {
            return Err(self.response_error(response, None, None).await);
        }

        let body = self.read_body(response).await?;
        xml::parse_list_buckets(&body)
    }

    /// Checks whether a bucket exists and is reachable.
    ///
    /// # Errors
    /// Propagates everything except not-found conditions, which map to
    /// `Ok(false)`.
    pub async fn bucket_exists(&self, bucket: &str) -> S3Result<bool> {
        validation::check_bucket_name(bucket)?;
        let region = match self.bucket_region(bucket).await {
            Ok(region) => region,
            Err(Error::Server(e)) if e.code == "NoSuchBucket" || e.code == "NotFound" => return Ok(false),
            Err(e) => return Err(e),
        };

        let req = S3Request::new(Method::HEAD).bucket(bucket);
        let response = self.execute(req, &region).await?;
        match response.status {
            status if status.is_success() => {
                drain(response.body).await;
                Ok(true)
            }
            StatusCode::NOT_FOUND => {
                drain(response.body).await;
                Ok(false)
            }
            _ => Err(self.response_error(response, Some(bucket), None).await),
        }
    }

    /// Deletes an empty bucket and evicts its region-cache entry.
    pub async fn remove_bucket(&self, bucket: &str) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        let req = S3Request::new(Method::DELETE).bucket(bucket);
        let response = self
            .execute_for_bucket(bucket, None, req, &[StatusCode::NO_CONTENT])
            .await?;
        drain(response.body).await;
        self.regions.remove(bucket);
        Ok(())
    }

    /// Reads the bucket ACL and classifies it as a canned ACL.
    ///
    /// # Errors
    /// Returns `UnsupportedAcl` when the grants do not correspond to any
    /// canned policy (for example public WRITE without public READ).
    pub async fn get_bucket_acl(&self, bucket: &str) -> S3Result<CannedAcl> {
        validation::check_bucket_name(bucket)?;
        let req = S3Request::new(Method::GET).bucket(bucket).query_flag("acl");
        let response = self.execute_for_bucket(bucket, None, req, &[StatusCode::OK]).await?;
        let body = self.read_body(response).await?;
        let grants = xml::parse_acl(&body)?;
        classify_acl(bucket, &grants)
    }

    /// Applies a canned ACL to the bucket.
    pub async fn set_bucket_acl(&self, bucket: &str, acl: CannedAcl) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        let req = S3Request::new(Method::PUT)
            .bucket(bucket)
            .query_flag("acl")
            .header(header::X_AMZ_ACL, acl.as_str())?;
        let response = self.execute_for_bucket(bucket, None, req, &[StatusCode::OK]).await?;
        drain(response.body).await;
        Ok(())
    }

    // ------------------------------------------------------------ objects

    /// Lazily lists objects under `prefix`. Without `recursive`, keys are
    /// grouped at `/` into common prefixes.
    ///
    /// # Errors
    /// Argument validation happens here; page errors terminate the stream.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> S3Result<ListObjects<'_>> {
        validation::check_bucket_name(bucket)?;
        Ok(ListObjects::new(
            self,
            bucket.to_owned(),
            prefix.map(str::to_owned),
            recursive,
        ))
    }

    pub(crate) async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        marker: Option<&str>,
        recursive: bool,
    ) -> S3Result<xml::ObjectsPage> {
        let mut req = S3Request::new(Method::GET).bucket(bucket).query("max-keys", "1000");
        if !recursive {
            req = req.query("delimiter", "/");
        }
        if let Some(prefix) = prefix {
            req = req.query("prefix", prefix);
        }
        if let Some(marker) = marker {
            req = req.query("marker", marker);
        }
        let response = self.execute_for_bucket(bucket, None, req, &[StatusCode::OK]).await?;
        let body = self.read_body(response).await?;
        xml::parse_list_objects(&body)
    }

    /// Reads object metadata via `HEAD`.
    pub async fn stat_object(&self, bucket: &str, key: &str) -> S3Result<ObjectStat> {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;
        let req = S3Request::new(Method::HEAD).bucket(bucket).object(key);
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK])
            .await?;

        let stat = ObjectStat {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            size: header_value(&response, header::CONTENT_LENGTH)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            etag: header_value(&response, header::ETAG).map(|v| trim_etag(&v)).unwrap_or_default(),
            content_type: header_value(&response, header::CONTENT_TYPE),
            last_modified: header_value(&response, header::LAST_MODIFIED)
                .and_then(|v| Timestamp::parse_http_date(&v).ok()),
        };
        drain(response.body).await;
        Ok(stat)
    }

    /// Downloads a whole object. The returned body is a passthrough stream;
    /// consume it fully or drop it to release the connection.
    pub async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectContent> {
        self.get_partial_object(bucket, key, 0, 0).await
    }

    /// Downloads `length` bytes starting at `offset`; `length == 0` means
    /// to the end of the object. Both 200 and 206 replies are accepted.
    pub async fn get_partial_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> S3Result<ObjectContent> {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;

        let mut req = S3Request::new(Method::GET).bucket(bucket).object(key);
        if offset > 0 || length > 0 {
            let range = if length == 0 {
                format!("bytes={offset}-")
            } else {
                format!("bytes={offset}-{}", offset + length - 1)
            };
            req = req.header(header::RANGE, &range)?;
        }

        let response = self
            .execute_for_bucket(
                bucket,
                Some(key),
                req,
                &[StatusCode::OK, StatusCode::PARTIAL_CONTENT],
            )
            .await?;

        Ok(ObjectContent {
            content_length: header_value(&response, header::CONTENT_LENGTH).and_then(|v| v.parse().ok()),
            content_type: header_value(&response, header::CONTENT_TYPE),
            etag: header_value(&response, header::ETAG).map(|v| trim_etag(&v)),
            last_modified: header_value(&response, header::LAST_MODIFIED)
                .and_then(|v| Timestamp::parse_http_date(&v).ok()),
            body: response.body,
        })
    }

    /// Uploads an object from a byte stream that must produce exactly
    /// `size` bytes. Objects over 5 MiB go through multipart upload,
    /// resuming any in-progress session for the key. Returns the object's
    /// ETag.
    ///
    /// # Errors
    /// Fails with `SizeMismatch` (without completing the upload) when the
    /// stream length differs from `size`.
    pub async fn put_object<S>(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        content_type: Option<&str>,
        body: S,
    ) -> S3Result<String>
    where
        S: Stream<Item = Result<Bytes, StdError>> + Send,
    {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;
        if size > multipart::MAX_OBJECT_SIZE {
            return Err(invalid_argument!(
                "object size {size} exceeds the 5 TiB multipart limit"
            ));
        }
        let content_type = match content_type {
            Some(ct) if !ct.is_empty() => ct,
            _ => "application/octet-stream",
        };
        multipart::upload(self, bucket, key, size, content_type, body).await
    }

    /// Deletes an object.
    pub async fn remove_object(&self, bucket: &str, key: &str) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;
        let req = S3Request::new(Method::DELETE).bucket(bucket).object(key);
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::NO_CONTENT])
            .await?;
        drain(response.body).await;
        Ok(())
    }

    // ---------------------------------------------------------- multipart

    /// Lazily lists in-progress multipart uploads under `prefix`.
    ///
    /// # Errors
    /// Argument validation happens here; page errors terminate the stream.
    pub fn list_incomplete_uploads(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> S3Result<ListIncompleteUploads<'_>> {
        validation::check_bucket_name(bucket)?;
        Ok(ListIncompleteUploads::new(
            self,
            bucket.to_owned(),
            prefix.map(str::to_owned),
            recursive,
        ))
    }

    /// Aborts the youngest in-progress multipart upload for the key; a
    /// no-op success when none exists. Parts already uploaded are discarded
    /// by the server.
    pub async fn remove_incomplete_upload(&self, bucket: &str, key: &str) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;
        let Some(upload_id) = self.find_upload_id(bucket, key).await? else {
            return Ok(());
        };
        let req = S3Request::new(Method::DELETE)
            .bucket(bucket)
            .object(key)
            .query("uploadId", &upload_id);
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::NO_CONTENT])
            .await?;
        drain(response.body).await;
        Ok(())
    }

    pub(crate) async fn list_uploads_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        key_marker: Option<&str>,
        upload_id_marker: Option<&str>,
        recursive: bool,
    ) -> S3Result<xml::UploadsPage> {
        let mut req = S3Request::new(Method::GET).bucket(bucket).query_flag("uploads");
        if !recursive {
            req = req.query("delimiter", "/");
        }
        if let Some(prefix) = prefix {
            req = req.query("prefix", prefix);
        }
        if let Some(key_marker) = key_marker {
            req = req.query("key-marker", key_marker);
        }
        if let Some(upload_id_marker) = upload_id_marker {
            req = req.query("upload-id-marker", upload_id_marker);
        }
        let response = self.execute_for_bucket(bucket, None, req, &[StatusCode::OK]).await?;
        let body = self.read_body(response).await?;
        xml::parse_list_uploads(&body)
    }

    /// Finds the upload id of the latest-initiated in-progress multipart
    /// upload for `key`, if any.
    pub(crate) async fn find_upload_id(&self, bucket: &str, key: &str) -> S3Result<Option<String>> {
        let mut latest: Option<(Timestamp, String)> = None;
        let mut key_marker: Option<String> = None;
        let mut upload_id_marker: Option<String> = None;
        loop {
            let page = self
                .list_uploads_page(
                    bucket,
                    Some(key),
                    key_marker.as_deref(),
                    upload_id_marker.as_deref(),
                    true,
                )
                .await?;
            for upload in page.uploads {
                if upload.key == key
                    && latest.as_ref().is_none_or(|(initiated, _)| upload.initiated > *initiated)
                {
                    latest = Some((upload.initiated, upload.upload_id));
                }
            }
            if !page.is_truncated {
                break;
            }
            key_marker = page.next_key_marker;
            upload_id_marker = page.next_upload_id_marker;
            if key_marker.is_none() && upload_id_marker.is_none() {
                break;
            }
        }
        Ok(latest.map(|(_, upload_id)| upload_id))
    }

    pub(crate) async fn list_parts_page(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: Option<u16>,
    ) -> S3Result<xml::PartsPage> {
        let mut req = S3Request::new(Method::GET)
            .bucket(bucket)
            .object(key)
            .query("uploadId", upload_id);
        if let Some(marker) = part_number_marker {
            req = req.query("part-number-marker", &marker.to_string());
        }
        let response = self.execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK]).await?;
        let body = self.read_body(response).await?;
        xml::parse_list_parts(&body)
    }

    /// Fetches the complete part list of an in-progress upload.
    pub(crate) async fn list_all_parts(&self, bucket: &str, key: &str, upload_id: &str) -> S3Result<Vec<PartInfo>> {
        let mut parts = Vec::new();
        let mut marker: Option<u16> = None;
        loop {
            let page = self.list_parts_page(bucket, key, upload_id, marker).await?;
            parts.extend(page.parts);
            if !page.is_truncated {
                break;
            }
            marker = page.next_part_number_marker;
            if marker.is_none() {
                break;
            }
        }
        Ok(parts)
    }

    pub(crate) async fn initiate_multipart(&self, bucket: &str, key: &str, content_type: &str) -> S3Result<String> {
        let req = S3Request::new(Method::POST)
            .bucket(bucket)
            .object(key)
            .query_flag("uploads")
            .header(header::CONTENT_TYPE, content_type)?;
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK])
            .await?;
        let body = self.read_body(response).await?;
        xml::parse_initiate_multipart(&body)
    }

    pub(crate) async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u16,
        block: Bytes,
    ) -> S3Result<String> {
        let req = S3Request::new(Method::PUT)
            .bucket(bucket)
            .object(key)
            .query("partNumber", &part_number.to_string())
            .query("uploadId", upload_id)
            .payload(block);
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK])
            .await?;
        let etag = header_value(&response, header::ETAG)
            .map(|v| trim_etag(&v))
            .ok_or_else(|| Error::Decode(format!("upload part {part_number} response carries no ETag")))?;
        drain(response.body).await;
        Ok(etag)
    }

    pub(crate) async fn complete_multipart(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[(u16, String)],
    ) -> S3Result<String> {
        let body = xml::complete_multipart_body(parts)?;
        let req = S3Request::new(Method::POST)
            .bucket(bucket)
            .object(key)
            .query("uploadId", upload_id)
            .payload(Bytes::from(body));
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK])
            .await?;
        let status = response.status;
        let body = self.read_body(response).await?;
        // The server may answer 200 with an error document.
        match xml::parse_complete_multipart(&body) {
            Ok(etag) if !etag.is_empty() => Ok(etag),
            _ => Err(xml::error_from_response(status, &body, Some(bucket), Some(key))),
        }
    }

    /// Uploads a single-PUT object, returning the reply's ETag.
    pub(crate) async fn put_object_single(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> S3Result<String> {
        let req = S3Request::new(Method::PUT)
            .bucket(bucket)
            .object(key)
            .header(header::CONTENT_TYPE, content_type)?
            .payload(data);
        let response = self
            .execute_for_bucket(bucket, Some(key), req, &[StatusCode::OK])
            .await?;
        let etag = header_value(&response, header::ETAG)
            .map(|v| trim_etag(&v))
            .unwrap_or_default();
        drain(response.body).await;
        Ok(etag)
    }

    // ----------------------------------------------------------- presign

    /// Mints a pre-signed GET URL valid for `expires_secs` seconds.
    pub async fn presigned_get_object(&self, bucket: &str, key: &str, expires_secs: u64) -> S3Result<String> {
        self.presign_object(Method::GET, bucket, key, expires_secs).await
    }

    /// Mints a pre-signed PUT URL valid for `expires_secs` seconds.
    pub async fn presigned_put_object(&self, bucket: &str, key: &str, expires_secs: u64) -> S3Result<String> {
        self.presign_object(Method::PUT, bucket, key, expires_secs).await
    }

    async fn presign_object(&self, method: Method, bucket: &str, key: &str, expires_secs: u64) -> S3Result<String> {
        validation::check_bucket_name(bucket)?;
        validation::check_object_key(key)?;
        validation::check_expires(expires_secs)?;
        let region = self.bucket_region(bucket).await?;
        Ok(self.presign_with_date(&method, bucket, key, &region, expires_secs, &AmzDate::now()))
    }

    fn presign_with_date(
        &self,
        method: &Method,
        bucket: &str,
        key: &str,
        region: &str,
        expires_secs: u64,
        date: &AmzDate,
    ) -> String {
        let escaped = escape_object_key(key);
        let uri_path = self.endpoint.uri_path_for(Some(bucket), Some(&escaped));
        let authority = self.endpoint.authority_for(Some(bucket));

        let mut query = crate::request::Query::new();
        sig_v4::presign_url(
            method,
            &authority,
            &uri_path,
            &mut query,
            &self.credentials,
            region,
            date,
            expires_secs,
        );

        format!(
            "{}://{}{}?{}",
            self.endpoint.scheme().as_str(),
            authority,
            uri_path,
            query.to_url_query()
        )
    }

    /// Signs a POST policy, returning the form fields a browser upload
    /// needs: the caller-set fields plus `policy`, `x-amz-algorithm`,
    /// `x-amz-credential`, `x-amz-date` and `x-amz-signature`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when the policy misses its expiration,
    /// bucket or key condition, or has already expired.
    pub async fn presigned_post_policy(&self, policy: &PostPolicy) -> S3Result<PostForm> {
        policy.check_ready(OffsetDateTime::now_utc())?;
        let bucket = policy
            .bucket()
            .ok_or_else(|| invalid_argument!("post policy misses the bucket condition"))?
            .to_owned();
        let region = self.bucket_region(&bucket).await?;
        Ok(self.sign_post_form(policy, &region, &AmzDate::now()))
    }

    fn sign_post_form(&self, policy: &PostPolicy, region: &str, date: &AmzDate) -> PostForm {
        let credential = format!("{}/{}", self.credentials.access_key(), sig_v4::scope(date, region));

        let amz_conditions = [
            PostPolicyCondition::Eq {
                field: "x-amz-date".to_owned(),
                value: date.fmt_iso8601(),
            },
            PostPolicyCondition::Eq {
                field: "x-amz-algorithm".to_owned(),
                value: sig_v4::ALGORITHM.to_owned(),
            },
            PostPolicyCondition::Eq {
                field: "x-amz-credential".to_owned(),
                value: credential.clone(),
            },
        ];
        let document = policy.policy_document(&amz_conditions);
        let policy_base64 = base64_simd::STANDARD.encode_to_string(document.to_string());

        let signature = sig_v4::sign_post_policy(&policy_base64, self.credentials.secret_key(), date, region);

        let mut form = policy.form_data().clone();
        form.insert("policy".to_owned(), policy_base64);
        form.insert("x-amz-algorithm".to_owned(), sig_v4::ALGORITHM.to_owned());
        form.insert("x-amz-credential".to_owned(), credential);
        form.insert("x-amz-date".to_owned(), date.fmt_iso8601());
        form.insert("x-amz-signature".to_owned(), signature);
        form
    }
}

fn header_value(response: &HttpResponse, name: &'static str) -> Option<String> {
    let value = response.headers.get(name)?;
    Some(String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Maps ACL grants onto a canned ACL, or fails with `UnsupportedAcl`.
///
/// Public WRITE without public READ has no canned equivalent.
fn classify_acl(bucket: &str, grants: &[xml::AclGrant]) -> S3Result<CannedAcl> {
    let mut public_read = false;
    let mut public_write = false;
    let mut authenticated_read = false;

    for grant in grants {
        match (grant.grantee_uri.as_deref(), grant.permission.as_str()) {
            (Some(ALL_USERS_URI), "READ") => public_read = true,
            (Some(ALL_USERS_URI), "WRITE") => public_write = true,
            (Some(AUTHENTICATED_USERS_URI), "READ") => authenticated_read = true,
            _ => {}
        }
    }

    if public_read && public_write {
        Ok(CannedAcl::PublicReadWrite)
    } else if public_write {
        Err(Error::UnsupportedAcl(format!(
            "bucket {bucket:?} grants public WRITE without public READ"
        )))
    } else if public_read {
        Ok(CannedAcl::PublicRead)
    } else if authenticated_read {
        Ok(CannedAcl::AuthenticatedRead)
    } else {
        Ok(CannedAcl::Private)
    }
}
