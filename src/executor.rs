//! Where promise work runs.
//!
//! A promise never spawns anything on its own: executor closures, late
//! reactions and nothing else are handed to an [`Executor`]. The default is
//! a [`ThreadExecutor`], which gives every task its own OS thread.
use std::sync::Arc;
use std::thread;

use once_cell::sync::Lazy;

use crate::Error;

/// A unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks independently of the caller.
pub trait Executor: Send + Sync {
    /// Takes ownership of `task` and arranges for it to run exactly once.
    ///
    /// An implementation either runs the task (now or later, on any thread)
    /// and returns `Ok`, or drops it without running it and returns `Err`.
    /// Callers rely on an `Err` meaning the task will never run: promises
    /// reject on it, and late continuations fall back to running inline.
    fn execute(&self, task: Task) -> Result<(), Error>;
}

/// Spawns one OS thread per task.
#[derive(Debug, Clone, Default)]
pub struct ThreadExecutor {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name given to every spawned thread.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) -> Result<(), Error> {
        let mut builder = thread::Builder::new();
        if let Some(ref name) = self.name {
            builder = builder.name(name.clone());
        }
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder
            .spawn(task)
            .map(drop)
            .map_err(|err| Error::Schedule(err.to_string()))
    }
}

/// Runs the task right away on the calling thread.
///
/// Settlement becomes synchronous, which makes ordering in tests
/// deterministic. Blocking on a promise from inside its own executor closure
/// deadlocks with this executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) -> Result<(), Error> {
        task();
        Ok(())
    }
}

static DEFAULT_EXECUTOR: Lazy<Arc<dyn Executor>> = Lazy::new(|| {
    log::debug!("initializing default thread executor");
    Arc::new(ThreadExecutor::new().with_name("settle-worker"))
});

/// The process-wide executor used by constructors without an `_in` suffix.
pub fn default_executor() -> Arc<dyn Executor> {
    DEFAULT_EXECUTOR.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;

    #[test]
    fn test_inline_runs_on_caller() {
        let caller = thread::current().id();
        let (tx, rx) = channel::unbounded();
        InlineExecutor
            .execute(Box::new(move || tx.send(thread::current().id()).unwrap()))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn test_thread_executor_names_threads() {
        let (tx, rx) = channel::bounded(1);
        ThreadExecutor::new()
            .with_name("named-task")
            .execute(Box::new(move || {
                tx.send(thread::current().name().map(str::to_owned)).unwrap()
            }))
            .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-task"));
    }

    #[test]
    fn test_default_executor_is_shared() {
        assert!(Arc::ptr_eq(&default_executor(), &default_executor()));
    }
}
