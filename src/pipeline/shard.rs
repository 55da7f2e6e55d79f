// file: src/pipeline/shard.rs
// description: minify and unminify tasks over json-lines shard files
// reference: https://docs.rs/walkdir

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::execution::{TaskRegistry, task_fn};
use crate::fingerprint::HashCodec;
use crate::minify::{Minifier, UnminifyOutcome, Unminifier};
use crate::models::{Document, MinifiedDocument};
use crate::records::{read_records, write_records};
use crate::segment::{HttpSegmentFetcher, SegmentFetcher, SegmentStore};
use crate::utils::{OperationTimer, Validator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const MINIFY_TASK: &str = "minify_file";
pub const UNMINIFY_TASK: &str = "unminify_file";

const SLOW_SHARD: Duration = Duration::from_secs(600);

/// One input shard and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Expands `inputs` into shard jobs writing under `output_dir`.
///
/// Files are taken as given. Directories are walked for `.json` and
/// `.jsonl` files, and their layout below the directory is kept in the
/// output.
pub fn discover_shards(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<ShardJob>> {
    let mut jobs = Vec::new();

    for input in inputs {
        if input.is_file() {
            let Some(name) = input.file_name() else {
                return Err(PipelineError::Validation(format!(
                    "Input has no file name: {}",
                    input.display()
                )));
            };
            jobs.push(ShardJob {
                input: input.clone(),
                output: output_dir.join(name),
            });
            continue;
        }

        Validator::validate_directory(input)?;
        info!("Scanning directory: {}", input.display());

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && Validator::is_record_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();

        for path in found {
            let relative = path.strip_prefix(input).unwrap_or(&path).to_path_buf();
            jobs.push(ShardJob {
                output: output_dir.join(relative),
                input: path,
            });
        }
    }

    info!("Found {} shard files", jobs.len());
    Ok(jobs)
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Execution(format!("Blocking task failed: {}", e)))?
}

pub async fn minify_file(job: ShardJob) -> Result<String> {
    let timer = OperationTimer::new("minify_file");
    let input = job.input.clone();

    let count = blocking(move || {
        let docs: Vec<Document> = read_records(&job.input)?;
        let minified = Minifier::new().minify_all(&docs);
        write_records(&job.output, &minified)?;
        Ok(minified.len())
    })
    .await?;

    timer.warn_if_slow(SLOW_SHARD, &input.display().to_string());
    let metrics = timer.finish_with_count(count);
    debug!("{}", metrics.format());

    Ok(format!("Minified {} documents from {}", count, input.display()))
}

/// Reconstructs one shard with the given unminifier.
///
/// The batch is sorted by segment first so that each segment is fetched
/// once. Reconstructed documents are written even when some fail.
pub async fn unminify_shard<F: SegmentFetcher>(
    job: &ShardJob,
    unminifier: &mut Unminifier<F>,
) -> Result<UnminifyOutcome> {
    let input = job.input.clone();
    let mut batch: Vec<MinifiedDocument> = blocking(move || read_records(&input)).await?;
    batch.sort_by(|a, b| a.cc_segment.cmp(&b.cc_segment));

    let unavailable = unminifier.look_for(&batch).await;
    if !unavailable.is_empty() {
        warn!(
            "{} segments unavailable for {}",
            unavailable.len(),
            job.input.display()
        );
    }

    let outcome = unminifier.unminify(batch).await;
    for failure in &outcome.failures {
        warn!(
            "Could not unminify {} from {}: {}",
            Validator::truncate_text(&failure.url, 120),
            failure.cc_segment,
            failure.error
        );
    }

    let output = job.output.clone();
    let UnminifyOutcome {
        documents,
        failures,
    } = outcome;
    let documents = blocking(move || {
        write_records(&output, &documents)?;
        Ok(documents)
    })
    .await?;

    Ok(UnminifyOutcome {
        documents,
        failures,
    })
}

pub async fn unminify_file(job: ShardJob, config: Arc<Config>) -> Result<String> {
    let timer = OperationTimer::new("unminify_file");

    let fetcher = HttpSegmentFetcher::new(&config.segments)?;
    let mut unminifier = Unminifier::new(SegmentStore::new(fetcher, &config.segments));
    let outcome = unminify_shard(&job, &mut unminifier).await?;

    timer.warn_if_slow(SLOW_SHARD, &job.input.display().to_string());
    let metrics = timer.finish_with_count(outcome.total());
    debug!("{}", metrics.format());

    Ok(format!(
        "Unminified {} documents from {} ({} failures, {} segments retrieved)",
        outcome.documents.len(),
        job.input.display(),
        outcome.failures.len(),
        unminifier.retrieved_segments()
    ))
}

/// Registry holding the shard tasks the CLI can run.
pub fn build_registry(config: Arc<Config>) -> Result<TaskRegistry<ShardJob>> {
    TaskRegistry::new()
        .register(MINIFY_TASK, task_fn(minify_file))?
        .register(
            UNMINIFY_TASK,
            task_fn(move |job: ShardJob| unminify_file(job, Arc::clone(&config))),
        )
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectedRecord {
    pub url: String,
    pub cc_segment: String,
    pub nlines: usize,
}

/// Lists each minified record of `path` with its decoded line count.
pub fn inspect_file(path: &Path) -> Result<Vec<InspectedRecord>> {
    let docs: Vec<MinifiedDocument> = read_records(path)?;
    docs.into_iter()
        .map(|doc| {
            let nlines = HashCodec::decode(&doc.hashes)?.len();
            Ok(InspectedRecord {
                url: doc.url,
                cc_segment: doc.cc_segment,
                nlines,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::store::tests::{FakeFetcher, SEGMENT, test_config};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn doc(url: &str, segment: &str, content: &str) -> Document {
        let mut doc = Document {
            url: url.to_string(),
            cc_segment: segment.to_string(),
            language: Some("en".to_string()),
            ..Default::default()
        };
        doc.set_raw_content(content.to_string());
        doc
    }

    #[test]
    fn test_discover_shards() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("in");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.json"), "").unwrap();
        fs::write(root.join("sub").join("b.jsonl"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        let single = temp_dir.path().join("single.json");
        fs::write(&single, "").unwrap();

        let out = temp_dir.path().join("out");
        let jobs = discover_shards(&[root.clone(), single.clone()], &out).unwrap();

        assert_eq!(
            jobs,
            vec![
                ShardJob {
                    input: root.join("a.json"),
                    output: out.join("a.json"),
                },
                ShardJob {
                    input: root.join("sub").join("b.jsonl"),
                    output: out.join("sub").join("b.jsonl"),
                },
                ShardJob {
                    input: single,
                    output: out.join("single.json"),
                },
            ]
        );
    }

    #[test]
    fn test_discover_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let result = discover_shards(&[temp_dir.path().join("missing")], temp_dir.path());
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_minify_file_writes_records_without_text() {
        let temp_dir = TempDir::new().unwrap();
        let job = ShardJob {
            input: temp_dir.path().join("docs.json"),
            output: temp_dir.path().join("out").join("docs.json"),
        };
        write_records(
            &job.input,
            &[doc("http://one.example/", "seg", "alpha\nbeta")],
        )
        .unwrap();

        let message = minify_file(job.clone()).await.unwrap();
        assert!(message.starts_with("Minified 1 documents"));

        let written = fs::read_to_string(&job.output).unwrap();
        assert!(!written.contains("raw_content"));
        assert!(!written.contains("alpha"));

        let inspected = inspect_file(&job.output).unwrap();
        assert_eq!(
            inspected,
            vec![InspectedRecord {
                url: "http://one.example/".to_string(),
                cc_segment: "seg".to_string(),
                nlines: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_unminify_shard_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config();
        let url = crate::segment::store::segment_url(&config.url_root, "seg-1");

        let originals = vec![
            doc("http://two.example.com", "seg-1", "gamma"),
            doc("http://one.example.com", "seg-1", "alpha\nbeta"),
        ];
        let minified = Minifier::new().minify_all(&originals);

        let job = ShardJob {
            input: temp_dir.path().join("mini.json"),
            output: temp_dir.path().join("full.json"),
        };
        write_records(&job.input, &minified).unwrap();

        let fetcher = FakeFetcher::serving(&[(url.as_str(), SEGMENT)]);
        let mut unminifier = Unminifier::new(SegmentStore::new(fetcher, &config));
        let outcome = unminify_shard(&job, &mut unminifier).await.unwrap();

        assert!(outcome.is_complete_success());
        assert_eq!(unminifier.retrieved_segments(), 1);

        let docs: Vec<Document> = read_records(&job.output).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].raw_content, "gamma");
        assert_eq!(docs[1].raw_content, "alpha\nbeta");
        assert_eq!(docs[1].title, "One");
    }

    #[test]
    fn test_build_registry() {
        let registry = build_registry(Arc::new(Config::default_config())).unwrap();
        assert_eq!(registry.names(), vec![MINIFY_TASK, UNMINIFY_TASK]);
    }
}
