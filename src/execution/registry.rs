// file: src/execution/registry.rs
// description: named task functions available to the executors
// reference: explicit capability object instead of a process-wide registry

use crate::error::{PipelineError, Result};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

pub type TaskFuture = BoxFuture<'static, Result<String>>;

/// A task turns one argument into a progress message.
pub type TaskFn<A> = Arc<dyn Fn(A) -> TaskFuture + Send + Sync>;

pub fn task_fn<A, F, Fut>(f: F) -> TaskFn<A>
where
    A: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    Arc::new(move |arg: A| -> TaskFuture { Box::pin(f(arg)) })
}

pub struct TaskRegistry<A> {
    tasks: BTreeMap<String, TaskFn<A>>,
}

impl<A> TaskRegistry<A> {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// Adds `task` under `name`.
    ///
    /// Registering the very same function twice is accepted; a different
    /// function under an existing name is rejected.
    pub fn register(mut self, name: &str, task: TaskFn<A>) -> Result<Self> {
        if let Some(existing) = self.tasks.get(name) {
            if Arc::ptr_eq(existing, &task) {
                return Ok(self);
            }
            return Err(PipelineError::Execution(format!(
                "Conflicting definitions registered for task {}",
                name
            )));
        }

        self.tasks.insert(name.to_string(), task);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<TaskFn<A>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::Execution(format!("Unknown task: {}", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }
}

impl<A> Default for TaskRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
