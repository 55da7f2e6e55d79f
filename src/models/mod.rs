// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod segment_record;

pub use document::{Document, MinifiedDocument};
pub use segment_record::SegmentRecord;
