//! Lazy paginated listings.
//!
//! Listings are finite streams that fetch one page at a time and yield
//! records as they arrive. Pagination is internal: the stream keeps
//! requesting pages while the server reports truncation, terminates after
//! the last page, and ends with a single error item if any page fails.

use crate::client::Client;
use crate::error::{Error, S3Result};
use crate::types::{ListEntry, UploadInfo};
use crate::utils::BoxFuture;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use transform_stream::AsyncTryStream;

type PageGen<'a, T> = AsyncTryStream<T, Error, BoxFuture<'a, Result<(), Error>>>;

/// Stream of objects and common prefixes under a bucket, created by
/// [`Client::list_objects`].
pub struct ListObjects<'a> {
    inner: PageGen<'a, ListEntry>,
}

impl<'a> ListObjects<'a> {
    pub(crate) fn new(client: &'a Client, bucket: String, prefix: Option<String>, recursive: bool) -> Self {
        let inner = AsyncTryStream::new(|mut y| -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let mut marker: Option<String> = None;
                loop {
                    let page = client
                        .list_objects_page(&bucket, prefix.as_deref(), marker.as_deref(), recursive)
                        .await?;

                    let mut last_key: Option<String> = None;
                    for entry in page.entries {
                        if let ListEntry::Object(object) = &entry {
                            last_key = Some(object.key.clone());
                        }
                        y.yield_ok(entry).await;
                    }

                    if !page.is_truncated {
                        break;
                    }
                    // Without a delimiter the server omits NextMarker; the
                    // last yielded key takes its place.
                    marker = page.next_marker.or(last_key);
                    if marker.is_none() {
                        break;
                    }
                }
                Ok(())
            })
        });
        Self { inner }
    }
}

impl Stream for ListObjects<'_> {
    type Item = S3Result<ListEntry>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

/// Stream of in-progress multipart uploads under a bucket, created by
/// [`Client::list_incomplete_uploads`].
pub struct ListIncompleteUploads<'a> {
    inner: PageGen<'a, UploadInfo>,
}

impl<'a> ListIncompleteUploads<'a> {
    pub(crate) fn new(client: &'a Client, bucket: String, prefix: Option<String>, recursive: bool) -> Self {
        let inner = AsyncTryStream::new(|mut y| -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let mut key_marker: Option<String> = None;
                let mut upload_id_marker: Option<String> = None;
                loop {
                    let page = client
                        .list_uploads_page(
                            &bucket,
                            prefix.as_deref(),
                            key_marker.as_deref(),
                            upload_id_marker.as_deref(),
                            recursive,
                        )
                        .await?;

                    for upload in page.uploads {
                        y.yield_ok(upload).await;
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
                Ok(())
            })
        });
        Self { inner }
    }
}

impl Stream for ListIncompleteUploads<'_> {
    type Item = S3Result<UploadInfo>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
