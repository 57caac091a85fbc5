use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use crate::{Error, Result, WorkerResult, windowing::NumWorkers, windowing::Window};

/// Bounded set of worker threads that lives for the duration of one engine call.
/// Every chunk of jobs is a join point: `map_ordered` only returns once all jobs of the chunk are done.
pub(crate) struct WorkerPool {
    pool: rayon::ThreadPool,
    granularity: usize,
}

impl WorkerPool {
    pub(crate) fn new(num_workers: NumWorkers, granularity: usize) -> Result<Self> {
        if granularity == 0 {
            return Err(Error::InvalidArgument("Chunk granularity must be positive".to_string()));
        }

        let mut pool_builder = rayon::ThreadPoolBuilder::new().thread_name(|index| format!("rasterwin-worker-{index}"));
        match num_workers {
            NumWorkers::AllCpus => {}
            NumWorkers::Count(0) => {
                return Err(Error::InvalidArgument("The number of workers must be positive".to_string()));
            }
            NumWorkers::Count(count) => pool_builder = pool_builder.num_threads(count),
        }

        let pool = pool_builder
            .build()
            .map_err(|e| Error::Runtime(format!("Failed to create threadpool: {e}")))?;

        Ok(Self { pool, granularity })
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `f` on every job in the pool, the results are returned in the order of the jobs.
    /// The first failing job fails the whole chunk.
    pub(crate) fn map_ordered<J, T, F>(&self, jobs: Vec<J>, f: F) -> Result<Vec<T>>
    where
        J: Send,
        T: Send,
        F: Fn(J) -> Result<T> + Sync + Send,
    {
        self.pool
            .install(|| jobs.into_par_iter().with_min_len(self.granularity).map(f).collect())
    }
}

/// Runs a user function for the given window, errors and panics become a `WorkerFailure` for that window.
pub(crate) fn run_job<T>(window: Window, job: impl FnOnce() -> WorkerResult<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(Error::WorkerFailure { window, source }),
        Err(panic) => {
            let msg = if let Some(msg) = panic.downcast_ref::<&str>() {
                msg.to_string()
            } else if let Some(msg) = panic.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            };

            Err(Error::WorkerFailure {
                window,
                source: format!("worker panicked: {msg}").into(),
            })
        }
    }
}
