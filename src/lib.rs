// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod execution;
pub mod fingerprint;
pub mod minify;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod segment;
pub mod utils;

pub use config::{Config, ExecutionConfig, SegmentConfig};
pub use error::{PipelineError, Result};
pub use execution::{
    AnyExecutor, DebugExecutor, ExecutionReport, Executor, PoolExecutor, TaskRegistry,
    get_executor,
};
pub use fingerprint::{Fingerprint, HashCodec, LineHasher};
pub use minify::{FailurePolicy, Minifier, UnminifyFailure, UnminifyOutcome, Unminifier};
pub use models::{Document, MinifiedDocument, SegmentRecord};
pub use pipeline::{PipelineStats, ProgressTracker, ShardJob};
pub use segment::{HttpSegmentFetcher, SegmentFetcher, SegmentIndex, SegmentStore};
pub use utils::{OperationTimer, PerformanceMetrics, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _minifier = Minifier::new();
        assert_eq!(LineHasher::hash("a"), LineHasher::hash("a"));
    }
}
