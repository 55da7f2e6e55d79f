// file: src/minify/unminifier.rs
// description: rebuilds full documents from minified ones using their source segments
// reference: groups a batch by segment so each segment is fetched once

use crate::error::{PipelineError, Result};
use crate::fingerprint::{Fingerprint, HashCodec, LineHasher};
use crate::models::{Document, MinifiedDocument, SegmentRecord};
use crate::segment::{SegmentFetcher, SegmentStore, SegmentStoreStats};
use crate::utils::Validator;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// What to do with the rest of a batch once a segment group had a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abandon,
}

#[derive(Debug)]
pub struct UnminifyFailure {
    pub url: String,
    pub digest: String,
    pub cc_segment: String,
    pub error: PipelineError,
}

impl UnminifyFailure {
    fn new(doc: &MinifiedDocument, error: PipelineError) -> Self {
        Self {
            url: doc.url.clone(),
            digest: doc.digest.clone(),
            cc_segment: doc.cc_segment.clone(),
            error,
        }
    }
}

/// Every input of a batch ends up in exactly one of the two lists.
#[derive(Debug, Default)]
pub struct UnminifyOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<UnminifyFailure>,
}

impl UnminifyOutcome {
    pub fn total(&self) -> usize {
        self.documents.len() + self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Unminifier<F> {
    store: SegmentStore<F>,
    policy: FailurePolicy,
}

impl<F: SegmentFetcher> Unminifier<F> {
    pub fn new(store: SegmentStore<F>) -> Self {
        Self {
            store,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches every segment referenced by `batch` ahead of time.
    ///
    /// Returns the segments that could not be fetched; their documents will
    /// fail when unminified.
    pub async fn look_for(&mut self, batch: &[MinifiedDocument]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut unavailable = Vec::new();

        for doc in batch {
            if !seen.insert(doc.cc_segment.as_str()) {
                continue;
            }
            if Validator::validate_segment_id(&doc.cc_segment).is_err()
                || self.store.ensure_cached(&doc.cc_segment).await.is_err()
            {
                unavailable.push(doc.cc_segment.clone());
            }
        }

        unavailable
    }

    pub async fn unminify(&mut self, batch: Vec<MinifiedDocument>) -> UnminifyOutcome {
        let mut outcome = UnminifyOutcome::default();
        let groups = group_by_segment(batch);
        let group_count = groups.len();
        let mut remaining = groups.into_iter();

        while let Some((segment, docs)) = remaining.next() {
            let failures_before = outcome.failures.len();
            self.unminify_group(&segment, docs, &mut outcome).await;

            if self.policy == FailurePolicy::Abandon && outcome.failures.len() > failures_before {
                warn!(
                    "Abandoning remaining segments after failure in {}",
                    segment
                );
                for (skipped, docs) in remaining.by_ref() {
                    for doc in docs {
                        let error = PipelineError::Abandoned {
                            segment: skipped.clone(),
                        };
                        outcome.failures.push(UnminifyFailure::new(&doc, error));
                    }
                }
            }
        }

        info!(
            "Unminified {} documents from {} segments ({} failures)",
            outcome.documents.len(),
            group_count,
            outcome.failures.len()
        );
        outcome
    }

    pub async fn unminify_one(&mut self, doc: MinifiedDocument) -> Result<Document> {
        let mut outcome = self.unminify(vec![doc]).await;
        match outcome.failures.pop() {
            Some(failure) => Err(failure.error),
            None => outcome.documents.pop().ok_or_else(|| {
                PipelineError::Validation("unminify produced no document".to_string())
            }),
        }
    }

    pub fn retrieved_segments(&self) -> usize {
        self.store.stats().segments_fetched
    }

    pub fn store_stats(&self) -> SegmentStoreStats {
        self.store.stats()
    }

    async fn unminify_group(
        &mut self,
        segment: &str,
        docs: Vec<MinifiedDocument>,
        outcome: &mut UnminifyOutcome,
    ) {
        if let Err(err) = Validator::validate_segment_id(segment) {
            warn!("Skipping {} documents: {}", docs.len(), err);
            for doc in docs {
                let error =
                    PipelineError::Validation(format!("invalid segment identifier {:?}", segment));
                outcome.failures.push(UnminifyFailure::new(&doc, error));
            }
            return;
        }

        let index = match self.store.fetch(segment).await {
            Ok(index) => index,
            Err(err) => {
                let message = match err {
                    PipelineError::Fetch { message, .. } => message,
                    other => other.to_string(),
                };
                for doc in docs {
                    let error = PipelineError::Fetch {
                        segment: segment.to_string(),
                        message: message.clone(),
                    };
                    outcome.failures.push(UnminifyFailure::new(&doc, error));
                }
                return;
            }
        };

        for doc in docs {
            let rebuilt = match index.locate(&doc.digest, &doc.url) {
                Some(record) => rebuild(&doc, record),
                None => Err(PipelineError::NotFound {
                    segment: segment.to_string(),
                    url: doc.url.clone(),
                    digest: doc.digest.clone(),
                }),
            };

            match rebuilt {
                Ok(full) => outcome.documents.push(full),
                Err(error) => {
                    debug!("Failed to unminify {}: {}", doc.url, error);
                    outcome.failures.push(UnminifyFailure::new(&doc, error));
                }
            }
        }
    }
}

/// Groups documents by segment, keeping first-appearance order of segments
/// and input order within each group.
fn group_by_segment(batch: Vec<MinifiedDocument>) -> Vec<(String, Vec<MinifiedDocument>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<MinifiedDocument>)> = Vec::new();

    for doc in batch {
        let position = *positions.entry(doc.cc_segment.clone()).or_insert_with(|| {
            groups.push((doc.cc_segment.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[position].1.push(doc);
    }

    groups
}

fn rebuild(doc: &MinifiedDocument, record: &SegmentRecord) -> Result<Document> {
    let targets = HashCodec::decode(&doc.hashes)?;
    let source_lines = record.lines();
    let kept = select_lines(&source_lines, &targets);

    if kept.len() != targets.len() {
        return Err(PipelineError::Reconstruction {
            url: doc.url.clone(),
            matched: kept.len(),
            expected: targets.len(),
        });
    }

    let mut full = Document {
        url: doc.url.clone(),
        date_download: record.date_download.clone(),
        digest: doc.digest.clone(),
        source_domain: record.source_domain.clone(),
        title: record.title.clone(),
        cc_segment: doc.cc_segment.clone(),
        original_nlines: source_lines.len(),
        original_length: record.length,
        language: doc.language.clone(),
        language_score: doc.language_score,
        perplexity: doc.perplexity,
        bucket: doc.bucket.clone(),
        ..Default::default()
    };
    full.set_raw_content(Document::join_lines(&kept));
    Ok(full)
}

/// Walks both sequences in order, consuming the first unconsumed source line
/// whose fingerprint equals the next target.
///
/// Filtering only removes lines, so duplicates keep their relative order and
/// the greedy choice recovers every target when the source is unchanged.
/// Fingerprint collisions are not detected.
fn select_lines<'a>(source_lines: &[&'a str], targets: &[Fingerprint]) -> Vec<&'a str> {
    let mut kept = Vec::with_capacity(targets.len());
    let mut wanted = targets.iter().peekable();

    for &line in source_lines {
        let Some(&&next) = wanted.peek() else {
            break;
        };
        if LineHasher::hash(line) == next {
            kept.push(line);
            wanted.next();
        }
    }

    kept
}
