//! Concurrent execution of independent fetch tasks with a shared deadline.

use std::time::Instant;

use crossbeam_channel::{RecvTimeoutError, bounded};
use log::warn;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SyncollError};

/// A fixed-size worker pool. Results are gathered at a single merge
/// point; a failed or late task fails the whole run.
pub struct FanOut {
    pool: ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("workers", &self.workers)
            .finish()
    }
}

impl FanOut {
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("syncoll-fetch-{i}"))
            .build()
            .map_err(|e| SyncollError::internal(format!("Failed to create thread pool: {e}")))?;
        Ok(FanOut { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run all tasks and return their results in task order.
    pub fn run<T, F>(&self, tasks: Vec<F>, deadline: Instant) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let num_tasks = tasks.len();
        let (tx, rx) = bounded(num_tasks);
        for (idx, task) in tasks.into_iter().enumerate() {
            let tx = tx.clone();
            self.pool.spawn(move || {
                // the receiver is gone if the run already failed
                let _ = tx.send((idx, task()));
            });
        }
        drop(tx);

        let mut results: Vec<Option<T>> = (0..num_tasks).map(|_| None).collect();
        for _ in 0..num_tasks {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((idx, Ok(value))) => results[idx] = Some(value),
                Ok((idx, Err(err))) => {
                    warn!("fetch task {idx} of {num_tasks} failed: {err}");
                    return Err(err);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(SyncollError::timeout(format!(
                        "{num_tasks} fetch tasks did not finish in time"
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SyncollError::ThreadJoinError(
                        "fetch worker exited without a result".to_string(),
                    ));
                }
            }
        }
        results
            .into_iter()
            .map(|r| r.ok_or_else(|| SyncollError::internal("missing fetch task result")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    type Task = Box<dyn FnOnce() -> Result<usize> + Send>;

    #[test]
    fn test_results_keep_task_order() {
        let fanout = FanOut::new(3).unwrap();
        let tasks: Vec<Task> = (0..6usize)
            .map(|i| {
                Box::new(move || {
                    thread::sleep(Duration::from_millis(((6 - i) * 5) as u64));
                    Ok(i * 10)
                }) as Task
            })
            .collect();
        let out = fanout
            .run(tasks, Instant::now() + Duration::from_secs(10))
            .unwrap();
        assert_eq!(out, vec![0, 10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_one_failure_fails_all() {
        let fanout = FanOut::new(2).unwrap();
        let tasks: Vec<Task> = vec![
            Box::new(|| Ok(1)),
            Box::new(|| Err(SyncollError::storage("broken shard"))),
        ];
        let err = fanout
            .run(tasks, Instant::now() + Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, SyncollError::Storage(_)));
    }

    #[test]
    fn test_deadline() {
        let fanout = FanOut::new(1).unwrap();
        let tasks: Vec<Task> = vec![Box::new(|| {
            thread::sleep(Duration::from_millis(300));
            Ok(1)
        })];
        let err = fanout
            .run(tasks, Instant::now() + Duration::from_millis(20))
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_no_tasks() {
        let fanout = FanOut::new(1).unwrap();
        let tasks: Vec<Task> = Vec::new();
        assert!(
            fanout
                .run(tasks, Instant::now() + Duration::from_secs(1))
                .unwrap()
                .is_empty()
        );
    }
}
