//! Conditional-request cache keyed by resolved URL
//!
//! The cache stores validators only. It never re-serves a body on its own:
//! every request still goes over the wire, which keeps the scoring model
//! tied to real request counts. `max-age` is deliberately ignored.

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use std::collections::HashMap;

/// Validators remembered from a previous 200 response
#[derive(Debug, Clone, Default)]
pub struct CachedEntry {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl CachedEntry {
    /// Build an entry from response headers; `None` when the response said
    /// `no-store`
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let directives = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ")
            .to_ascii_lowercase();
        if directives.contains("no-store") {
            return None;
        }

        let header_string = |name| {
            headers
                .get(name)
                .and_then(|v: &reqwest::header::HeaderValue| v.to_str().ok())
                .map(str::to_string)
        };
        Some(Self {
            etag: header_string(ETAG),
            last_modified: header_string(LAST_MODIFIED),
        })
    }

    /// Attach the validators to an outgoing request
    pub fn apply(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref last_modified) = self.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }
        if let Some(ref etag) = self.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        request
    }
}

/// Per-client store of cached validators
#[derive(Debug, Default)]
pub struct CacheStore {
    items: Mutex<HashMap<String, CachedEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedEntry> {
        self.items.lock().get(key).cloned()
    }

    pub fn set(&self, key: String, entry: CachedEntry) {
        self.items.lock().insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                reqwest::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn no_store_responses_are_not_cached() {
        let map = headers(&[("cache-control", "no-store"), ("etag", "\"abc\"")]);
        assert!(CachedEntry::from_headers(&map).is_none());
    }

    #[test]
    fn validators_are_captured() {
        let map = headers(&[
            ("cache-control", "public, max-age=3600"),
            ("etag", "\"abc\""),
            ("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        ]);
        let entry = CachedEntry::from_headers(&map).unwrap();
        assert_eq!(entry.etag.as_deref(), Some("\"abc\""));
        assert_eq!(
            entry.last_modified.as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn store_round_trip() {
        let store = CacheStore::new();
        assert!(store.is_empty());
        store.set(
            "http://example.com/".to_string(),
            CachedEntry {
                etag: Some("\"v1\"".into()),
                last_modified: None,
            },
        );
        assert_eq!(store.len(), 1);
        let entry = store.get("http://example.com/").unwrap();
        assert_eq!(entry.etag.as_deref(), Some("\"v1\""));
        assert!(store.get("http://example.com/other").is_none());
    }
}
