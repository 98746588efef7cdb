//! Worker pool for the filtering run.
//!
//! Spawns one thread per worker endpoint, named after its rank, and collects
//! what the workers return.
//!
//! # Key features
//! - Fixed size: the pool is built once per run and never resized
//! - Each worker owns its endpoint; the pool keeps no channels of its own
//! - Dropping the pool joins any worker that was not joined explicitly
//!
//! Workers exit on their own when the coordinator terminates them, or with an
//! error when the coordinator's endpoint is dropped, so joining never waits on
//! a signal from the pool itself.

use anyhow::{anyhow, Context, Result};
use std::thread;

use super::channel::Endpoint;
use super::message::Rank;

/// Fixed set of worker threads.
///
/// # Type Parameters
/// - `Output`: What each worker thread returns on success
pub(crate) struct WorkerPool<Output> {
    workers: Vec<(Rank, thread::JoinHandle<Result<Output>>)>,
}

impl<Output> WorkerPool<Output>
where
    Output: Send + 'static,
{
    /// Spawns one thread per endpoint running `worker_fn`.
    pub(crate) fn spawn<F>(endpoints: Vec<Endpoint>, worker_fn: F) -> Result<Self>
    where
        F: Fn(Endpoint) -> Result<Output> + Send + Sync + Clone + 'static,
    {
        if endpoints.is_empty() {
            return Err(anyhow!(
                "Cannot create WorkerPool with 0 workers. \
                At least one worker is needed to filter rows."
            ));
        }

        let mut workers = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let rank = endpoint.rank();
            let worker_fn = worker_fn.clone();

            let handle = thread::Builder::new()
                .name(format!("filter-worker-{rank}"))
                .spawn(move || worker_fn(endpoint))
                .with_context(|| format!("Failed to spawn worker thread {rank}"))?;

            workers.push((rank, handle));
        }

        Ok(Self { workers })
    }

    /// Waits for every worker and returns their outputs in rank order.
    ///
    /// Every worker is joined even if an earlier one failed; the first failure
    /// is returned.
    pub(crate) fn join(mut self) -> Result<Vec<Output>> {
        let mut outputs = Vec::with_capacity(self.workers.len());
        let mut first_error = None;

        for (rank, handle) in self.workers.drain(..) {
            let outcome = handle
                .join()
                .map_err(|_| anyhow!("Worker {rank} panicked"))
                .and_then(|result| result);
            match outcome {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    }
}

impl<Output> Drop for WorkerPool<Output> {
    fn drop(&mut self) {
        for (_, worker) in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
