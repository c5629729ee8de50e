//! A fixed-size worker pool.
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::executor::{Executor, Task};
use crate::Error;

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name: String,
    /// Worker stack size, platform default when `None`.
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            workers,
            thread_name: "settle-pool".to_owned(),
            stack_size: None,
        }
    }
}

impl PoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

/// Worker threads pulling tasks off a shared queue.
///
/// Promise work that blocks in `await_promise` occupies a worker for the
/// whole wait, so a pool smaller than the depth of such nesting can stall.
///
/// Dropping the pool closes the queue and joins every worker after it has
/// drained the tasks already queued.
pub struct ThreadPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl ThreadPool {
    /// Pool with the default configuration.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Result<Self, Error> {
        let workers = config.workers.max(1);
        let (tx, rx) = channel::unbounded::<Task>();
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let rx = rx.clone();
            let mut builder =
                thread::Builder::new().name(format!("{}-{}", config.thread_name, index));
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }
            let spawned = builder.spawn(move || {
                for task in rx.iter() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                        log::warn!("pool task panicked: {}", Error::from_panic(payload));
                    }
                }
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    log::error!("failed to spawn pool worker {}: {}", index, err);
                    drop(tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::Schedule(err.to_string()));
                }
            }
        }

        log::debug!("started thread pool with {} workers", workers);
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers.lock().len()
    }

    /// Stops accepting tasks and waits for the queued ones to finish.
    ///
    /// Calling this from one of the pool's own workers skips joining that
    /// worker.
    pub fn shutdown(&self) {
        if self.sender.lock().take().is_none() {
            return;
        }
        let current = thread::current().id();
        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::warn!("pool worker exited by panic");
            }
        }
        log::debug!("thread pool shut down");
    }
}

impl Executor for ThreadPool {
    fn execute(&self, task: Task) -> Result<(), Error> {
        match *self.sender.lock() {
            Some(ref sender) => sender.send(task).map_err(|_| Error::Shutdown),
            None => Err(Error::Shutdown),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
