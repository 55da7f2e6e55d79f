// file: src/segment/store.rs
// description: per-run cache of fetched and parsed archive segments
// reference: fetch-once-per-segment cache backing batch unminification

use super::fetch::SegmentFetcher;
use super::wet::read_segment;
use crate::config::SegmentConfig;
use crate::error::{PipelineError, Result};
use crate::models::SegmentRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{info, warn};

/// Parsed records of one segment, indexed by digest and by url.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    records: Vec<SegmentRecord>,
    by_digest: HashMap<String, usize>,
    by_url: HashMap<String, usize>,
}

impl SegmentIndex {
    pub fn new(records: Vec<SegmentRecord>) -> Self {
        let mut by_digest = HashMap::new();
        let mut by_url = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            by_digest.entry(record.digest.clone()).or_insert(position);
            by_url.entry(record.url.clone()).or_insert(position);
        }

        Self {
            records,
            by_digest,
            by_url,
        }
    }

    pub fn by_digest(&self, digest: &str) -> Option<&SegmentRecord> {
        self.by_digest.get(digest).map(|&i| &self.records[i])
    }

    pub fn by_url(&self, url: &str) -> Option<&SegmentRecord> {
        self.by_url.get(url).map(|&i| &self.records[i])
    }

    /// Looks a document up by digest, falling back to its url when the
    /// digest is empty or unknown.
    pub fn locate(&self, digest: &str, url: &str) -> Option<&SegmentRecord> {
        let by_digest = if digest.is_empty() {
            None
        } else {
            self.by_digest(digest)
        };
        by_digest.or_else(|| if url.is_empty() { None } else { self.by_url(url) })
    }

    pub fn records(&self) -> &[SegmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStoreStats {
    pub segments_fetched: usize,
    pub segments_failed: usize,
    pub records_indexed: usize,
}

#[derive(Debug)]
enum CacheEntry {
    Cached(SegmentIndex),
    Failed(String),
}

/// Owns every segment fetched during one run.
///
/// Entries are never evicted or refreshed. A segment whose fetch failed is
/// remembered and not requested again.
pub struct SegmentStore<F> {
    fetcher: F,
    url_root: String,
    retries: u32,
    cache: HashMap<String, CacheEntry>,
    stats: SegmentStoreStats,
}

impl<F: SegmentFetcher> SegmentStore<F> {
    pub fn new(fetcher: F, config: &SegmentConfig) -> Self {
        Self {
            fetcher,
            url_root: config.url_root.trim_end_matches('/').to_string(),
            retries: config.retries,
            cache: HashMap::new(),
            stats: SegmentStoreStats::default(),
        }
    }

    pub fn segment_url(&self, segment_id: &str) -> String {
        segment_url(&self.url_root, segment_id)
    }

    pub async fn fetch(&mut self, segment_id: &str) -> Result<&SegmentIndex> {
        let entry = match self.cache.entry(segment_id.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let url = segment_url(&self.url_root, segment_id);
                let fetched = self
                    .fetcher
                    .fetch_segment(&url, self.retries)
                    .await
                    .and_then(|bytes| read_segment(&bytes));
                let loaded = match fetched {
                    Ok(records) => {
                        let index = SegmentIndex::new(records);
                        self.stats.segments_fetched += 1;
                        self.stats.records_indexed += index.len();
                        info!(
                            "Fetched segment {} ({} records, {} segments so far)",
                            segment_id,
                            index.len(),
                            self.stats.segments_fetched
                        );
                        CacheEntry::Cached(index)
                    }
                    Err(e) => {
                        self.stats.segments_failed += 1;
                        let message = match e {
                            PipelineError::Fetch { message, .. } => message,
                            other => other.to_string(),
                        };
                        warn!("Segment {} unavailable: {}", segment_id, message);
                        CacheEntry::Failed(message)
                    }
                };
                vacant.insert(loaded)
            }
        };

        match entry {
            CacheEntry::Cached(index) => Ok(index),
            CacheEntry::Failed(message) => Err(PipelineError::Fetch {
                segment: segment_id.to_string(),
                message: message.clone(),
            }),
        }
    }

    pub async fn ensure_cached(&mut self, segment_id: &str) -> Result<()> {
        self.fetch(segment_id).await.map(|_| ())
    }

    pub fn is_cached(&self, segment_id: &str) -> bool {
        matches!(self.cache.get(segment_id), Some(CacheEntry::Cached(_)))
    }

    pub fn stats(&self) -> SegmentStoreStats {
        self.stats
    }
}

/// Location of a segment: ids that already are absolute URLs are kept.
pub fn segment_url(url_root: &str, segment_id: &str) -> String {
    if segment_id.starts_with("http://") || segment_id.starts_with("https://") {
        return segment_id.to_string();
    }
    format!(
        "{}/{}",
        url_root.trim_end_matches('/'),
        segment_id.trim_start_matches('/')
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const SEGMENT: &str = "WARC/1.0
WARC-Type: conversion
WARC-Target-URI: http://one.example.com
WARC-Date: 2019-03-18T00:00:00Z
WARC-Block-Digest: sha1:ONE

One
alpha
beta


WARC/1.0
WARC-Type: conversion
WARC-Target-URI: http://two.example.com
WARC-Date: 2019-03-18T00:00:00Z
WARC-Block-Digest: sha1:TWO

Two
gamma
";

    /// Serves canned segment bodies and counts calls per url.
    #[derive(Clone, Default)]
    pub(crate) struct FakeFetcher {
        pub(crate) bodies: Arc<HashMap<String, String>>,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl FakeFetcher {
        pub(crate) fn serving(segments: &[(&str, &str)]) -> Self {
            let bodies = segments
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect();
            Self {
                bodies: Arc::new(bodies),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SegmentFetcher for FakeFetcher {
        async fn fetch_segment(&self, url: &str, retries: u32) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| PipelineError::Fetch {
                    segment: url.to_string(),
                    message: format!("not found after {} attempt(s)", retries),
                })
        }
    }

    pub(crate) fn test_config() -> SegmentConfig {
        SegmentConfig {
            url_root: "https://data.example.org/".to_string(),
            retries: 3,
            timeout_secs: 5,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        }
    }

    #[test]
    fn test_segment_url() {
        assert_eq!(
            segment_url("https://root/", "/crawl-data/a.wet"),
            "https://root/crawl-data/a.wet"
        );
        assert_eq!(
            segment_url("https://root", "http://elsewhere/a.wet"),
            "http://elsewhere/a.wet"
        );
    }

    #[tokio::test]
    async fn test_fetch_is_cached() {
        let fetcher = FakeFetcher::serving(&[("https://data.example.org/seg", SEGMENT)]);
        let mut store = SegmentStore::new(fetcher.clone(), &test_config());

        assert_eq!(store.fetch("seg").await.unwrap().len(), 2);
        assert_eq!(store.fetch("seg").await.unwrap().len(), 2);
        store.ensure_cached("seg").await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(store.is_cached("seg"));
        assert_eq!(
            store.stats(),
            SegmentStoreStats {
                segments_fetched: 1,
                segments_failed: 0,
                records_indexed: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_segment_is_not_refetched() {
        let fetcher = FakeFetcher::serving(&[]);
        let mut store = SegmentStore::new(fetcher.clone(), &test_config());

        let first = store.fetch("missing").await.unwrap_err();
        let second = store.fetch("missing").await.unwrap_err();

        assert!(matches!(first, PipelineError::Fetch { .. }));
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(fetcher.calls(), 1);
        assert!(!store.is_cached("missing"));
        assert_eq!(store.stats().segments_fetched, 0);
        assert_eq!(store.stats().segments_failed, 1);
    }

    #[tokio::test]
    async fn test_locate_by_digest_then_url() {
        let fetcher = FakeFetcher::serving(&[("https://data.example.org/seg", SEGMENT)]);
        let mut store = SegmentStore::new(fetcher, &test_config());
        let index = store.fetch("seg").await.unwrap();

        let by_digest = index.locate("sha1:TWO", "http://wrong.example.com").unwrap();
        assert_eq!(by_digest.url, "http://two.example.com");

        let by_url = index.locate("sha1:UNKNOWN", "http://one.example.com").unwrap();
        assert_eq!(by_url.digest, "sha1:ONE");

        let no_digest = index.locate("", "http://two.example.com").unwrap();
        assert_eq!(no_digest.title, "Two");

        assert!(index.locate("sha1:UNKNOWN", "").is_none());
        assert!(index.locate("", "").is_none());
    }
}
