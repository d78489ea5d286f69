//! Bounded fan-out of work items with early abort

use crate::config::ExtractorConfig;
use crate::error::PoolError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

enum Outcome<T, E> {
    Done(T),
    Failed(E),
    Skipped,
}

/// Runs work items on at most `max_workers` concurrent tasks
///
/// The first failure raises an abort flag: items that have not started are
/// skipped, items in flight get `join_timeout` to finish. Results come back
/// in item order.
#[derive(Debug, Clone)]
pub struct SegmentWorkerPool {
    max_workers: usize,
    join_timeout: Duration,
}

impl SegmentWorkerPool {
    /// Create a pool
    pub fn new(max_workers: usize, join_timeout: Duration) -> Self {
        Self {
            max_workers: max_workers.max(1),
            join_timeout,
        }
    }

    /// Create a pool from the extraction configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.max_executor_threads, config.worker_join_timeout())
    }

    /// Concurrent workers
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run `work(index, item)` for every item.
    ///
    /// Dropping the returned future aborts every spawned task.
    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, work: F) -> Result<Vec<T>, PoolError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(usize, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let abort = Arc::new(AtomicBool::new(false));
        let work = Arc::new(work);
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let abort = Arc::clone(&abort);
            let work = Arc::clone(&work);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Outcome::Skipped);
                };
                if abort.load(Ordering::Acquire) {
                    return (index, Outcome::Skipped);
                }
                match work(index, item).await {
                    Ok(value) => (index, Outcome::Done(value)),
                    Err(error) => {
                        abort.store(true, Ordering::Release);
                        (index, Outcome::Failed(error))
                    }
                }
            });
        }

        let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut first_failure = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Outcome::Done(value))) => results[index] = Some(value),
                Ok((_, Outcome::Skipped)) => {}
                Ok((index, Outcome::Failed(error))) => {
                    first_failure = Some((index, error));
                    break;
                }
                Err(join_error) => {
                    abort.store(true, Ordering::Release);
                    return Err(PoolError::Panicked(join_error.to_string()));
                }
            }
        }

        if let Some((index, error)) = first_failure {
            debug!(index, in_flight = tasks.len(), "Work item failed, draining workers");
            let drain = async {
                while tasks.join_next().await.is_some() {}
            };
            if tokio::time::timeout(self.join_timeout, drain).await.is_err() {
                warn!(timeout = ?self.join_timeout, "Workers did not finish after failure");
                return Err(PoolError::JoinTimeout(self.join_timeout));
            }
            return Err(PoolError::Task {
                index,
                source: error,
            });
        }

        Ok(results.into_iter().flatten().collect())
    }
}

impl Default for SegmentWorkerPool {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}
