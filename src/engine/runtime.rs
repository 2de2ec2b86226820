//! Worker pool for deferred operations.
//!
//! Blocking calls run on the caller's thread. Deferred calls are turned into
//! background tasks and pushed onto a bounded FIFO queue that a fixed set of
//! worker threads drains. Each task completes a single-shot channel that the
//! caller observes through a `TaskHandle`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tokio::sync::oneshot;

use crate::error::{SpellError, SpellResult};
use crate::operation::Operation;

/// Type-erased unit of work run by a worker.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of named worker threads.
pub(crate) struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub(crate) fn start(name: &str, workers: usize, queue_capacity: usize) -> SpellResult<Self> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let in_flight = Arc::clone(&in_flight);
            let spawned = thread::Builder::new()
                .name(format!("{name}-{idx}"))
                .spawn(move || {
                    tracing::debug!(worker = idx, "worker started");
                    while let Ok(job) = rx.recv() {
                        job();
                        in_flight.fetch_sub(1, Ordering::AcqRel);
                    }
                    tracing::debug!(worker = idx, "worker stopped");
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // Unwind the workers already running before reporting.
                    drop(tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SpellError::Spawn { source });
                }
            }
        }

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
            in_flight,
        })
    }

    pub(crate) fn try_submit(&self, job: Job) -> SpellResult<()> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                match err {
                    TrySendError::Full(_) => {
                        tracing::warn!(capacity = self.queue_capacity, "task queue full");
                        Err(SpellError::QueueFull {
                            capacity: self.queue_capacity,
                        })
                    }
                    TrySendError::Disconnected(_) => Err(SpellError::Closed),
                }
            }
        }
    }

    /// Tasks queued or running.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn shutdown(self) {
        // Close the channel: workers will drain queued jobs then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Completion handle of a deferred operation.
///
/// Resolves exactly once with the operation's result. It can be awaited
/// from any executor, waited on from a plain thread with `join`, or polled
/// without blocking with `try_take`. Dropping the handle does not cancel the
/// task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    operation: Operation,
    rx: oneshot::Receiver<SpellResult<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(id: u64, operation: Operation, rx: oneshot::Receiver<SpellResult<T>>) -> Self {
        Self { id, operation, rx }
    }

    /// A handle that is already resolved.
    pub(crate) fn ready(id: u64, operation: Operation, result: SpellResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self::new(id, operation, rx)
    }

    /// Identifier of the task, unique per speller.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Operation the task runs.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Blocks the current thread until the task completes.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; use
    /// `.await` there instead.
    pub fn join(self) -> SpellResult<T> {
        let operation = self.operation;
        self.rx
            .blocking_recv()
            .map_err(|_| SpellError::Disconnected { operation })?
    }

    /// Returns the result if the task has completed, without blocking.
    ///
    /// Returns `None` while the task is still queued or running. After a
    /// result has been taken, further calls report `Disconnected`.
    pub fn try_take(&mut self) -> Option<SpellResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(SpellError::Disconnected {
                operation: self.operation,
            })),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = SpellResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(SpellError::Disconnected { operation }))
        })
    }
}
