// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: shard tasks and progress tracking

pub mod progress;
mod shard;

pub use progress::{PipelineStats, ProgressTracker};
pub use shard::{
    InspectedRecord, MINIFY_TASK, ShardJob, UNMINIFY_TASK, build_registry, discover_shards,
    inspect_file, minify_file, unminify_file, unminify_shard,
};
