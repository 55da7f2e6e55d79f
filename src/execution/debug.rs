// file: src/execution/debug.rs
// description: sequential executor used for debugging and small runs

use super::{ExecutionReport, Executor, TaskRegistry, approx_length, now_rfc3339, progress_line};
use crate::error::Result;
use tracing::{error, info};

/// Runs tasks one after the other on the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugExecutor;

impl Executor for DebugExecutor {
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
        let args = args.into_iter();
        let approx_total = approx_length(args.size_hint());

        let mut report = ExecutionReport {
            task: name.to_string(),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            started_at: now_rfc3339(),
            finished_at: String::new(),
        };

        for (i, arg) in args.enumerate() {
            match task(arg).await {
                Ok(message) => {
                    report.succeeded += 1;
                    info!("{}", progress_line(&message, i + 1, approx_total));
                }
                Err(e) => {
                    report.failed += 1;
                    let line = format!("{} failed: {}", name, e);
                    error!("{}", progress_line(&line, i + 1, approx_total));
                    report.failures.push(e.to_string());
                }
            }
        }

        report.finished_at = now_rfc3339();
        Ok(report)
    }
}
