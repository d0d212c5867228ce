//! Browser POST upload policies.
//!
//! A [`PostPolicy`] is built up condition by condition, then signed with
//! [`Client::presigned_post_policy`](crate::Client::presigned_post_policy),
//! which returns the form fields for a `multipart/form-data` browser
//! upload.
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html>

use crate::error::S3Result;
use crate::types::Timestamp;
use crate::validation;

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;

/// Form fields for a browser `multipart/form-data` upload.
pub type PostForm = BTreeMap<String, String>;

/// A condition in the POST policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPolicyCondition {
    /// Exact match: the form field must equal the value.
    Eq { field: String, value: String },
    /// Prefix match: the form field must start with the prefix.
    StartsWith { field: String, prefix: String },
    /// Bounds on the uploaded file size, inclusive.
    ContentLengthRange { min: u64, max: u64 },
}

impl PostPolicyCondition {
    fn to_json(&self) -> Value {
        match self {
            Self::Eq { field, value } => json!(["eq", format!("${field}"), value]),
            Self::StartsWith { field, prefix } => json!(["starts-with", format!("${field}"), prefix]),
            Self::ContentLengthRange { min, max } => json!(["content-length-range", min, max]),
        }
    }
}

/// A POST policy under construction.
///
/// At signing time the policy must carry an expiration, a `bucket`
/// condition, and a `key` (or key prefix) condition.
#[derive(Debug, Clone, Default)]
pub struct PostPolicy {
    expiration: Option<Timestamp>,
    conditions: Vec<PostPolicyCondition>,
    form_data: BTreeMap<String, String>,
}

impl PostPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy expiration.
    pub fn set_expires(&mut self, expiration: impl Into<Timestamp>) {
        self.expiration = Some(expiration.into());
    }

    /// Requires the upload to use exactly this object key.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty or over-long key.
    pub fn set_key(&mut self, key: &str) -> S3Result<()> {
        validation::check_object_key(key)?;
        self.conditions.push(PostPolicyCondition::Eq {
            field: "key".to_owned(),
            value: key.to_owned(),
        });
        self.form_data.insert("key".to_owned(), key.to_owned());
        Ok(())
    }

    /// Requires the uploaded object key to start with `prefix`; the form's
    /// `key` field is prefilled with the prefix.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty prefix.
    pub fn set_key_starts_with(&mut self, prefix: &str) -> S3Result<()> {
        if prefix.is_empty() {
            return Err(invalid_argument!("key prefix must not be empty"));
        }
        self.conditions.push(PostPolicyCondition::StartsWith {
            field: "key".to_owned(),
            prefix: prefix.to_owned(),
        });
        self.form_data.insert("key".to_owned(), prefix.to_owned());
        Ok(())
    }

    /// Binds the policy to a bucket.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a malformed bucket name.
    pub fn set_bucket(&mut self, bucket: &str) -> S3Result<()> {
        validation::check_bucket_name(bucket)?;
        self.conditions.push(PostPolicyCondition::Eq {
            field: "bucket".to_owned(),
            value: bucket.to_owned(),
        });
        self.form_data.insert("bucket".to_owned(), bucket.to_owned());
        Ok(())
    }

    /// Requires a specific `Content-Type` on the upload.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty content type.
    pub fn set_content_type(&mut self, content_type: &str) -> S3Result<()> {
        if content_type.is_empty() {
            return Err(invalid_argument!("content type must not be empty"));
        }
        self.conditions.push(PostPolicyCondition::Eq {
            field: "Content-Type".to_owned(),
            value: content_type.to_owned(),
        });
        self.form_data.insert("Content-Type".to_owned(), content_type.to_owned());
        Ok(())
    }

    /// Bounds the uploaded file size, inclusive.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `min > max`.
    pub fn set_content_length_range(&mut self, min: u64, max: u64) -> S3Result<()> {
        if min > max {
            return Err(invalid_argument!("content length range is inverted: {min} > {max}"));
        }
        self.conditions
            .push(PostPolicyCondition::ContentLengthRange { min, max });
        Ok(())
    }

    /// The bucket this policy is bound to, if set.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.form_data.get("bucket").map(String::as_str)
    }

    pub(crate) fn form_data(&self) -> &BTreeMap<String, String> {
        &self.form_data
    }

    /// Sign-time invariants: expiration present and in the future, bucket
    /// bound, key (or key prefix) bound.
    pub(crate) fn check_ready(&self, now: OffsetDateTime) -> S3Result<()> {
        let Some(expiration) = self.expiration else {
            return Err(invalid_argument!("post policy misses the expiration"));
        };
        if OffsetDateTime::from(expiration) < now {
            return Err(invalid_argument!("post policy has already expired"));
        }
        if !self.form_data.contains_key("bucket") {
            return Err(invalid_argument!("post policy misses the bucket condition"));
        }
        if !self.form_data.contains_key("key") {
            return Err(invalid_argument!("post policy misses the key condition"));
        }
        Ok(())
    }

    /// Renders the policy JSON document, appending the signing-related
    /// conditions the form will carry.
    pub(crate) fn policy_document(&self, extra: &[PostPolicyCondition]) -> Value {
        let conditions: Vec<Value> = self
            .conditions
            .iter()
            .chain(extra)
            .map(PostPolicyCondition::to_json)
            .collect();
        let expiration = self.expiration.map(|e| e.to_iso8601()).unwrap_or_default();
        json!({
            "expiration": expiration,
            "conditions": conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp(s: &str) -> Timestamp {
        Timestamp::parse_iso8601(s).unwrap()
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from(timestamp("2030-01-01T00:00:00.000Z"))
    }

    #[test]
    fn test_ready_policy() {
        let mut policy = PostPolicy::new();
        policy.set_expires(timestamp("2030-06-01T00:00:00.000Z"));
        policy.set_bucket("mybucket").unwrap();
        policy.set_key("photos/avatar.png").unwrap();
        assert!(policy.check_ready(now()).is_ok());
        assert_eq!(policy.bucket(), Some("mybucket"));
    }

    #[test]
    fn test_missing_pieces_are_rejected() {
        let mut policy = PostPolicy::new();
        assert!(policy.check_ready(now()).is_err());

        policy.set_expires(timestamp("2030-06-01T00:00:00.000Z"));
        assert!(policy.check_ready(now()).is_err());

        policy.set_bucket("mybucket").unwrap();
        assert!(policy.check_ready(now()).is_err());

        policy.set_key("k").unwrap();
        assert!(policy.check_ready(now()).is_ok());
    }

    #[test]
    fn test_expired_policy_is_rejected() {
        let mut policy = PostPolicy::new();
        policy.set_expires(timestamp("2020-01-01T00:00:00.000Z"));
        policy.set_bucket("mybucket").unwrap();
        policy.set_key("k").unwrap();
        assert!(policy.check_ready(now()).is_err());
    }

    #[test]
    fn test_key_starts_with_prefills_form() {
        let mut policy = PostPolicy::new();
        policy.set_key_starts_with("user/alice/").unwrap();
        assert_eq!(policy.form_data().get("key").map(String::as_str), Some("user/alice/"));
        assert!(policy.set_key_starts_with("").is_err());
    }

    #[test]
    fn test_content_length_range_validation() {
        let mut policy = PostPolicy::new();
        assert!(policy.set_content_length_range(10, 5).is_err());
        assert!(policy.set_content_length_range(0, 1024).is_ok());
    }

    #[test]
    fn test_policy_document_shape() {
        let mut policy = PostPolicy::new();
        policy.set_expires(timestamp("2030-06-01T00:00:00.000Z"));
        policy.set_bucket("mybucket").unwrap();
        policy.set_key_starts_with("user/").unwrap();
        policy.set_content_type("image/png").unwrap();
        policy.set_content_length_range(1, 1024).unwrap();

        let doc = policy.policy_document(&[PostPolicyCondition::Eq {
            field: "x-amz-algorithm".to_owned(),
            value: "AWS4-HMAC-SHA256".to_owned(),
        }]);

        assert_eq!(doc["expiration"], "2030-06-01T00:00:00.000Z");
        let conditions = doc["conditions"].as_array().unwrap();
        assert_eq!(conditions.len(), 5);
        assert_eq!(conditions[0], json!(["eq", "$bucket", "mybucket"]));
        assert_eq!(conditions[1], json!(["starts-with", "$key", "user/"]));
        assert_eq!(conditions[2], json!(["eq", "$Content-Type", "image/png"]));
        assert_eq!(conditions[3], json!(["content-length-range", 1, 1024]));
        assert_eq!(conditions[4], json!(["eq", "$x-amz-algorithm", "AWS4-HMAC-SHA256"]));
    }
}
