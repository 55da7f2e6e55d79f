// file: src/execution/pool.rs
// description: concurrent executor backed by tokio tasks
// reference: bounded fan-out with a semaphore and buffer_unordered, progress via indicatif

use super::{ExecutionReport, Executor, TaskRegistry, now_rfc3339, progress_line};
use crate::error::{PipelineError, Result};
use crate::pipeline::progress::ProgressTracker;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Number of concurrent workers for a run.
///
/// `task_parallelism` cores are shared by tasks using `cpus` cores each;
/// a negative value stands for every available cpu.
pub fn parallelism(cpus: usize, task_parallelism: i64, available: usize) -> usize {
    let available = available.max(1);
    let cores = if task_parallelism < 0 {
        available
    } else {
        task_parallelism as usize
    };
    (cores / cpus.max(1)).min(available).max(1)
}

/// Progress line logged when the `index`-th task of a run finishes.
fn completion_line(
    name: &str,
    outcome: &std::result::Result<String, String>,
    index: usize,
    approx_total: i64,
) -> String {
    match outcome {
        Ok(message) => progress_line(message, index, approx_total),
        Err(e) => progress_line(&format!("{} failed: {}", name, e), index, approx_total),
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub struct PoolExecutor {
    log_dir: PathBuf,
    processes: usize,
}

impl PoolExecutor {
    pub fn new(log_dir: PathBuf, cpus: usize, task_parallelism: i64) -> Self {
        Self {
            log_dir,
            processes: parallelism(cpus, task_parallelism, available_cpus()),
        }
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn summary_path(&self, task: &str) -> PathBuf {
        self.log_dir.join(format!("{}.summary.json", task))
    }

    fn write_summary(&self, report: &ExecutionReport) -> Result<()> {
        write_json(&self.log_dir, &self.summary_path(&report.task), report)
    }
}

fn write_json(dir: &Path, path: &Path, report: &ExecutionReport) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::FileOperation {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PipelineError::Serialization(e.to_string()))?;

    std::fs::write(path, json).map_err(|e| PipelineError::FileOperation {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Executor for PoolExecutor {
    async fn execute<A, I>(
        &self,
        registry: &TaskRegistry<A>,
        name: &str,
        args: I,
    ) -> Result<ExecutionReport>
    where
        A: Send + 'static,
        I: IntoIterator<Item = A>,
    {
        let task = registry.get(name)?;
        let args: Vec<A> = args.into_iter().collect();
        let started_at = now_rfc3339();

        info!(
            "Starting {} over {} processes ({} tasks).",
            name,
            self.processes,
            args.len()
        );

        let approx_total = args.len() as i64;
        let progress = Arc::new(ProgressTracker::new(args.len()));
        progress.set_message(name.to_string());
        let semaphore = Arc::new(Semaphore::new(self.processes));
        let finished = Arc::new(AtomicUsize::new(0));

        let outcomes: Vec<std::result::Result<String, String>> = stream::iter(args)
            .map(|arg| {
                let task = Arc::clone(&task);
                let semaphore = Arc::clone(&semaphore);
                let progress = Arc::clone(&progress);
                let finished = Arc::clone(&finished);

                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| format!("worker pool closed: {}", e))?;

                    let result = tokio::spawn(task(arg)).await;
                    let index = finished.fetch_add(1, Ordering::SeqCst) + 1;

                    let outcome = match result {
                        Ok(Ok(message)) => Ok(message),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(e) => {
                            error!("Task panicked: {}", e);
                            Err(PipelineError::Execution(e.to_string()).to_string())
                        }
                    };

                    let line = completion_line(name, &outcome, index, approx_total);
                    match outcome {
                        Ok(_) => {
                            progress.inc_completed();
                            info!("{}", line);
                        }
                        Err(_) => {
                            progress.inc_failed();
                            warn!("{}", line);
                        }
                    }
                    outcome
                }
            })
            .buffer_unordered(self.processes)
            .collect()
            .await;

        progress.finish();

        let mut report = ExecutionReport {
            task: name.to_string(),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            started_at,
            finished_at: now_rfc3339(),
        };
        for outcome in outcomes {
            match outcome {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    report.failed += 1;
                    report.failures.push(e);
                }
            }
        }

        let stats = progress.get_stats();
        info!(
            "Finished {}: {} succeeded, {} failed ({:.1}% success)",
            name,
            report.succeeded,
            report.failed,
            stats.success_rate()
        );

        self.write_summary(&report)?;
        Ok(report)
    }
}
