//! Bounded worker pool used to fan tracks out to the external tools.
//!
//! Items are queued on a channel that is closed once everything has been
//! enqueued. Each worker drains the queue until it is empty and closed, so
//! every item is handled by exactly one worker. Jobs report their own
//! failures through their return value; one failing item never stops the
//! others.

use std::thread;

use crossbeam_channel::unbounded;

use crate::Result;

/// Lifecycle of a single batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    /// Workers are running and items are being enqueued.
    Dispatching,
    /// The queue is closed; workers are finishing what is left.
    Draining,
    Done,
}

#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    state: BatchState,
}

impl WorkerPool {
    /// Creates a pool with `workers` threads, at least one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            state: BatchState::Idle,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Runs `job` once per item and blocks until every worker has exited.
    ///
    /// Never spawns more threads than there are items. Results come back in
    /// completion order.
    pub fn run<T, R, F>(&mut self, items: Vec<T>, job: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let total = items.len();
        let workers = self.workers.min(total).max(1);
        let (result_tx, result_rx) = unbounded::<R>();
        self.state = BatchState::Dispatching;

        let dispatched = thread::scope(|scope| -> Result<()> {
            let (item_tx, item_rx) = unbounded::<T>();
            let job = &job;

            for id in 0..workers {
                let item_rx = item_rx.clone();
                let result_tx = result_tx.clone();
                thread::Builder::new()
                    .name(format!("mix-worker-{id}"))
                    .spawn_scoped(scope, move || {
                        let mut handled = 0usize;
                        for item in item_rx.iter() {
                            if result_tx.send(job(item)).is_err() {
                                break;
                            }
                            handled += 1;
                        }
                        tracing::debug!(worker = id, handled, "worker finished");
                    })?;
            }
            drop(item_rx);
            drop(result_tx);
            tracing::debug!(workers, items = total, "dispatching");

            for item in items {
                if item_tx.send(item).is_err() {
                    tracing::error!("work queue closed before every item was enqueued");
                    break;
                }
            }
            drop(item_tx);
            self.state = BatchState::Draining;
            Ok(())
        });

        self.state = BatchState::Done;
        dispatched?;
        Ok(result_rx.try_iter().collect())
    }
}
