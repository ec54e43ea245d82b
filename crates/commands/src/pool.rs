use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{runtime::Handle, sync::Semaphore, task::JoinHandle};

/// Runs command bodies on a tokio runtime, at most `max_concurrent` at a
/// time.
///
/// Submission never blocks: work past the limit is spawned straight away
/// and parks until a permit frees up, so the backlog is unbounded.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    runtime: Handle,
    permits: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    max_concurrent: usize,
}

/// Decrements the pending count when submitted work finishes or is dropped.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl WorkerPool {
    #[must_use]
    pub fn new(runtime: Handle, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            pending: Arc::new(AtomicUsize::new(0)),
            max_concurrent,
        }
    }

    /// Queue `work`; it starts once a permit is available.
    pub fn submit<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.pending.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(Arc::clone(&self.pending));
        self.runtime.spawn(async move {
            let _guard = guard;
            // Only errors on a closed semaphore; this one is never closed.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            work.await;
        })
    }

    /// Spawn side work (typing indicators, notifications) that does not
    /// count against the limit.
    pub fn spawn_detached<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(work)
    }

    /// Submitted work that has not finished yet, running or waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
