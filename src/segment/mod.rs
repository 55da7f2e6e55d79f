// file: src/segment/mod.rs
// description: archive segment retrieval, parsing, and caching
// reference: internal module structure

pub mod fetch;
pub mod store;
pub mod wet;

pub use fetch::{HttpSegmentFetcher, SegmentFetcher};
pub use store::{SegmentIndex, SegmentStore, SegmentStoreStats, segment_url};
pub use wet::{parse_segment, read_segment};
