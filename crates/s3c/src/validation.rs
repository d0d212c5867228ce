//! Argument validation for the public API surface.
//!
//! All checks return [`Error::InvalidArgument`](crate::Error::InvalidArgument)
//! and run before any network I/O.

use crate::error::S3Result;

/// Longest pre-signed URL validity S3 accepts, in seconds (7 days).
pub const MAX_EXPIRES_SECS: u64 = 604_800;

/// Longest object key S3 accepts, in bytes.
pub const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Checks an S3 bucket name: 3-63 characters, lowercase letters, digits,
/// `-` and `.`, starting and ending with a letter or digit, with no
/// consecutive dots.
///
/// # Errors
/// Returns `InvalidArgument` when the name violates the grammar.
pub fn check_bucket_name(name: &str) -> S3Result<()> {
    let bytes = name.as_bytes();
    if !(3..=63).contains(&bytes.len()) {
        return Err(invalid_argument!("bucket name must be 3-63 characters: {name:?}"));
    }
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return Err(invalid_argument!(
            "bucket name must start and end with a letter or digit: {name:?}"
        ));
    }
    for &b in bytes {
        if !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.') {
            return Err(invalid_argument!("bucket name contains invalid character: {name:?}"));
        }
    }
    if name.contains("..") {
        return Err(invalid_argument!("bucket name contains consecutive dots: {name:?}"));
    }
    Ok(())
}

/// Checks an object key: non-empty and at most 1024 bytes.
///
/// # Errors
/// Returns `InvalidArgument` when the key is empty or too long.
pub fn check_object_key(key: &str) -> S3Result<()> {
    if key.is_empty() {
        return Err(invalid_argument!("object key must not be empty"));
    }
    if key.len() > MAX_OBJECT_KEY_LEN {
        return Err(invalid_argument!(
            "object key exceeds {MAX_OBJECT_KEY_LEN} bytes: {} bytes",
            key.len()
        ));
    }
    Ok(())
}

/// Checks a pre-signed URL expiry: between 1 second and 7 days.
///
/// # Errors
/// Returns `InvalidArgument` when the expiry is out of range.
pub fn check_expires(secs: u64) -> S3Result<()> {
    if !(1..=MAX_EXPIRES_SECS).contains(&secs) {
        return Err(invalid_argument!(
            "expiry must be between 1 and {MAX_EXPIRES_SECS} seconds: {secs}"
        ));
    }
    Ok(())
}

/// Checks a region code: lowercase letters, digits and single hyphens,
/// starting with a letter.
///
/// # Errors
/// Returns `InvalidArgument` when the region string is malformed.
pub fn check_region(region: &str) -> S3Result<()> {
    let bytes = region.as_bytes();
    let valid = !region.is_empty()
        && bytes[0].is_ascii_lowercase()
        && bytes.iter().all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !region.starts_with('-')
        && !region.ends_with('-')
        && !region.contains("--");
    if valid {
        Ok(())
    } else {
        Err(invalid_argument!("invalid region: {region:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_names() {
        assert!(check_bucket_name("mybucket").is_ok());
        assert!(check_bucket_name("my-bucket.backup").is_ok());
        assert!(check_bucket_name("m1").is_err());
        assert!(check_bucket_name("MyBucket").is_err());
        assert!(check_bucket_name("-bucket").is_err());
        assert!(check_bucket_name("bucket-").is_err());
        assert!(check_bucket_name("my..bucket").is_err());
        assert!(check_bucket_name("my_bucket").is_err());
        assert!(check_bucket_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_object_keys() {
        assert!(check_object_key("a").is_ok());
        assert!(check_object_key("dir/file with spaces.txt").is_ok());
        assert!(check_object_key("").is_err());
        assert!(check_object_key(&"k".repeat(1025)).is_err());
    }

    #[test]
    fn test_expires() {
        assert!(check_expires(1).is_ok());
        assert!(check_expires(86_400).is_ok());
        assert!(check_expires(MAX_EXPIRES_SECS).is_ok());
        assert!(check_expires(0).is_err());
        assert!(check_expires(MAX_EXPIRES_SECS + 1).is_err());
    }

    #[test]
    fn test_regions() {
        assert!(check_region("us-east-1").is_ok());
        assert!(check_region("eu-west-2").is_ok());
        assert!(check_region("local").is_ok());
        assert!(check_region("").is_err());
        assert!(check_region("Us-East-1").is_err());
        assert!(check_region("us--east-1").is_err());
        assert!(check_region("-us-east-1").is_err());
    }
}
