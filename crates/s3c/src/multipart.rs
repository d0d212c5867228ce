//! Multipart upload orchestration.
//!
//! Bodies up to [`MIN_PART_SIZE`] take the single-PUT path; larger bodies
//! are uploaded in parts. Re-running an upload after a partial failure
//! resumes the youngest in-progress session for the key and skips parts the
//! server already holds, matched by size and MD5. The server-side session
//! is never aborted on error, so a later retry can pick it up again.

use crate::client::Client;
use crate::error::{S3Result, StdError};
use crate::stream::SizeGuard;
use crate::utils::crypto::hex_md5;

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// Smallest part the S3 API accepts, except for the final one (5 MiB).
pub(crate) const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest single part (5 GiB).
pub(crate) const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Hard cap on the number of parts per upload.
pub(crate) const MAX_PART_COUNT: u64 = 10_000;

/// Largest object a multipart upload can produce (5 TiB).
pub(crate) const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// Picks a part size that keeps the whole object within
/// [`MAX_PART_COUNT`] parts while staying in the `[5 MiB, 5 GiB]` band.
pub(crate) fn pick_part_size(size: u64) -> u64 {
    (size / (MAX_PART_COUNT - 1)).clamp(MIN_PART_SIZE, MAX_PART_SIZE)
}

/// Uploads `body` as the object `bucket/key`, returning the object's ETag.
///
/// `body` must produce exactly `size` bytes; the upload fails with
/// [`Error::SizeMismatch`](crate::Error::SizeMismatch) before completion
/// otherwise.
pub(crate) async fn upload<S>(
    client: &Client,
    bucket: &str,
    key: &str,
    size: u64,
    content_type: &str,
    body: S,
) -> S3Result<String>
where
    S: Stream<Item = Result<Bytes, StdError>> + Send,
{
    let guarded = SizeGuard::new(body, size);
    futures::pin_mut!(guarded);

    if size <= MIN_PART_SIZE {
        let mut buf = BytesMut::with_capacity(size as usize);
        while let Some(chunk) = guarded.next().await {
            buf.extend_from_slice(&chunk?);
        }
        return client.put_object_single(bucket, key, content_type, buf.freeze()).await;
    }

    // Resume the youngest in-progress upload, or start a fresh one.
    let (upload_id, existing_parts) = match client.find_upload_id(bucket, key).await? {
        Some(upload_id) => {
            let parts = client.list_all_parts(bucket, key, &upload_id).await?;
            tracing::debug!(bucket, key, upload_id = %upload_id, parts = parts.len(), "resuming multipart upload");
            (upload_id, parts)
        }
        None => {
            let upload_id = client.initiate_multipart(bucket, key, content_type).await?;
            tracing::debug!(bucket, key, upload_id = %upload_id, "initiated multipart upload");
            (upload_id, Vec::new())
        }
    };

    let existing: HashMap<u16, (String, u64)> = existing_parts
        .into_iter()
        .map(|p| (p.part_number, (p.etag, p.size)))
        .collect();

    let part_size = pick_part_size(size);
    let mut completed: Vec<(u16, String)> = Vec::new();
    let mut part_number: u16 = 0;

    let mut buf = BytesMut::new();
    let mut stream_done = false;
    while !stream_done || !buf.is_empty() {
        while (buf.len() as u64) < part_size && !stream_done {
            match guarded.next().await {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => stream_done = true,
            }
        }

        let take = buf.len().min(usize::try_from(part_size).unwrap_or(usize::MAX));
        if take == 0 {
            break;
        }
        let block = buf.split_to(take).freeze();
        part_number += 1;

        let block_md5 = hex_md5(&block);
        let etag = match existing.get(&part_number) {
            Some((etag, part_len)) if *part_len == block.len() as u64 && *etag == block_md5 => {
                tracing::debug!(part_number, "part already uploaded, skipping");
                etag.clone()
            }
            _ => client.upload_part(bucket, key, &upload_id, part_number, block).await?,
        };
        completed.push((part_number, etag));
    }

    client.complete_multipart(bucket, key, &upload_id, &completed).await
}
