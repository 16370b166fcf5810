//! Worker pool draining the job queue.
//!
//! Each worker only dequeues. The outbound call for every job runs in its own
//! task, so the worker count bounds the dequeue rate, not the number of calls
//! in flight. Setting `pipeline.max_in_flight` gates the spawn on a semaphore.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::context::BalancerContext;
use crate::pipeline::dispatch::dispatch;
use crate::pipeline::queue::JobReceiver;

/// Handles to the running worker loops.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `ctx.settings.workers` dequeue loops.
    pub fn spawn(ctx: Arc<BalancerContext>, jobs: JobReceiver) -> Self {
        let limiter = match ctx.settings.max_in_flight {
            0 => None,
            limit => Some(Arc::new(Semaphore::new(limit))),
        };

        let handles = (0..ctx.settings.workers)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    ctx.clone(),
                    jobs.clone(),
                    limiter.clone(),
                ))
            })
            .collect();

        tracing::info!(
            workers = ctx.settings.workers,
            max_in_flight = ctx.settings.max_in_flight,
            "Worker pool started"
        );
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop dequeuing. Jobs already dispatched keep running; queued jobs are abandoned.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn run_worker(
    worker_id: usize,
    ctx: Arc<BalancerContext>,
    jobs: JobReceiver,
    limiter: Option<Arc<Semaphore>>,
) {
    while let Some(job) = jobs.dequeue().await {
        let permit = match &limiter {
            Some(limiter) => match limiter.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => break,
            },
            None => None,
        };

        let ctx = ctx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let job_id = job.id;
            let outcome = dispatch(&ctx, job).await;
            ctx.stats.record_outcome(&outcome);

            // Already acknowledged to the client; nothing else to do with the result.
            match outcome {
                Ok(status) => tracing::trace!(job_id, status = %status, "Job delivered"),
                Err(error) => tracing::debug!(job_id, error = %error, "Job dropped"),
            }
        });
    }

    tracing::debug!(worker_id, "Job queue closed, worker exiting");
}
