// file: src/models/segment_record.rs
// description: one raw document as parsed from a fetched archive segment

use crate::fingerprint::split_lines;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub url: String,
    pub digest: String,
    pub date_download: String,
    pub source_domain: String,
    pub title: String,
    /// Unfiltered text, title line excluded.
    pub raw_content: String,
    /// Size of the record body as stored in the segment (title included),
    /// from `Content-Length` when the header is present.
    pub length: usize,
}

impl SegmentRecord {
    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.raw_content)
    }

    pub fn nlines(&self) -> usize {
        split_lines(&self.raw_content).len()
    }
}
