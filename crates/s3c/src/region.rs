//! Per-bucket region cache.
//!
//! Regions are discovered lazily through `GET /{bucket}?location` and then
//! pinned for the lifetime of the client: once a bucket maps to a region it
//! never maps to a different one. Lookup failures leave the cache untouched.

use std::collections::HashMap;
use std::sync::Mutex;

/// Region used to bootstrap discovery, and the only region self-hosted
/// endpoints resolve to.
pub(crate) const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Default)]
pub(crate) struct RegionCache {
    inner: Mutex<HashMap<String, String>>,
}

impl RegionCache {
    pub(crate) fn get(&self, bucket: &str) -> Option<String> {
        self.inner.lock().unwrap().get(bucket).cloned()
    }

    /// Records `bucket -> region`. The first writer wins; later writes for
    /// the same bucket are ignored.
    pub(crate) fn set(&self, bucket: &str, region: &str) {
        let mut map = self.inner.lock().unwrap();
        map.entry(bucket.to_owned()).or_insert_with(|| region.to_owned());
    }

    pub(crate) fn remove(&self, bucket: &str) {
        self.inner.lock().unwrap().remove(bucket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_roundtrip() {
        let cache = RegionCache::default();
        assert_eq!(cache.get("b"), None);
        cache.set("b", "eu-west-1");
        assert_eq!(cache.get("b").as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_cache_is_monotonic() {
        let cache = RegionCache::default();
        cache.set("b", "eu-west-1");
        cache.set("b", "ap-south-1");
        assert_eq!(cache.get("b").as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_remove_allows_rediscovery() {
        let cache = RegionCache::default();
        cache.set("b", "eu-west-1");
        cache.remove("b");
        assert_eq!(cache.get("b"), None);
        cache.set("b", "ap-south-1");
        assert_eq!(cache.get("b").as_deref(), Some("ap-south-1"));
    }
}
