//! Bounded FIFO job queue.
//!
//! # Design Decisions
//! - Backed by `tokio::sync::mpsc` with a fixed capacity
//! - `enqueue` waits for a free slot instead of failing or dropping
//! - One receiver is shared by every worker behind an async mutex

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::pipeline::job::Job;

/// The queue has no receivers left (workers are gone).
#[derive(Debug, thiserror::Error)]
#[error("job queue is closed")]
pub struct QueueClosed(pub Job);

/// Create a queue holding at most `capacity` jobs.
pub fn bounded(capacity: usize) -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        JobSender { tx },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side, cloned into every request handler.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    /// Push a job, waiting while the queue is full.
    pub async fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        self.tx.send(job).await.map_err(|e| QueueClosed(e.0))
    }

    /// Jobs currently waiting.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Consumer side, shared by the worker pool.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobReceiver {
    /// Wait for the next job. `None` once every sender is gone.
    pub async fn dequeue(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}
