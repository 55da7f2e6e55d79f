// file: src/execution/mod.rs
// description: bulk execution of named tasks over many arguments
// reference: sequential debug path and concurrent pool path behind one trait

mod debug;
mod pool;
mod registry;

pub use debug::DebugExecutor;
pub use pool::PoolExecutor;
pub use registry::{TaskFn, TaskFuture, TaskRegistry, task_fn};

use crate::config::ExecutionConfig;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

/// Summary of one `execute` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub task: String,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

pub trait Executor {
    /// Runs the task registered as `name` once per argument.
    ///
    /// A failing task is recorded in the report and does not stop the
    /// others.
    fn execute<A, I>(
        &self,
        registry: &TaskRegistry<A>,
        name: &str,
        args: I,
    ) -> impl Future<Output = Result<ExecutionReport>>
    where
        A: Send + 'static,
        I: IntoIterator<Item = A>;
}

/// Executor chosen at runtime from an execution string.
pub enum AnyExecutor {
    Debug(DebugExecutor),
    Pool(PoolExecutor),
}

impl Executor for AnyExecutor {
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
        match self {
            AnyExecutor::Debug(executor) => executor.execute(registry, name, args).await,
            AnyExecutor::Pool(executor) => executor.execute(registry, name, args).await,
        }
    }
}

/// Builds an executor from `"<mode>[,key=value...]"`.
///
/// `mp` selects the pool executor; options `cpus` and `task_parallelism`
/// override the configured values. Any other mode runs tasks sequentially.
pub fn get_executor(execution: &str, config: &ExecutionConfig) -> Result<AnyExecutor> {
    let mut parts = execution.split(',');
    let mode = parts.next().unwrap_or_default().trim();

    let mut cpus = config.cpus;
    let mut task_parallelism = config.task_parallelism;

    for option in parts {
        let Some((key, value)) = option.split_once('=') else {
            return Err(PipelineError::Config(format!(
                "Execution option must be key=value: {}",
                option
            )));
        };
        match key.trim() {
            "cpus" => cpus = parse_option(key, value)?,
            "task_parallelism" => task_parallelism = parse_option(key, value)?,
            other => warn!("Ignoring unknown execution option {}", other),
        }
    }

    if mode == "mp" {
        Ok(AnyExecutor::Pool(PoolExecutor::new(
            config.log_dir.clone(),
            cpus,
            task_parallelism,
        )))
    } else {
        Ok(AnyExecutor::Debug(DebugExecutor))
    }
}

fn parse_option<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        PipelineError::Config(format!("Invalid value for execution option {}: {}", key, value))
    })
}

/// Exact argument count when the iterator knows it, `-1` otherwise.
pub fn approx_length(size_hint: (usize, Option<usize>)) -> i64 {
    match size_hint {
        (lower, Some(upper)) if lower == upper => lower as i64,
        _ => -1,
    }
}

pub fn progress_line(message: &str, index: usize, approx_total: i64) -> String {
    format!("{} ({} / {})", message, index, approx_total)
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
