//! Asynchronous ingestion: stage the body, queue the job, acknowledge.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;

use crate::context::BalancerContext;
use crate::pipeline::job::Job;

/// Reasons an inbound request could not be queued.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
    #[error("job queue is closed")]
    QueueClosed,
}

impl IngestError {
    /// Status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Body(_) => StatusCode::BAD_REQUEST,
            IngestError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Copy the request body into a pooled buffer and queue it for dispatch.
///
/// Waits while the queue is full. Returns the job id once queued; delivery
/// happens later and its outcome is never reported back.
pub async fn ingest(ctx: &BalancerContext, request: Request<Body>) -> Result<u64, IngestError> {
    let (parts, body) = request.into_parts();

    let mut buffer = ctx.buffers.acquire();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    drop(stream);

    let job = Job::new(ctx.next_job_id(), parts, buffer);
    let id = job.id;
    ctx.jobs.enqueue(job).await.map_err(|_| IngestError::QueueClosed)?;
    ctx.stats.record_enqueued();

    tracing::trace!(job_id = id, queued = ctx.jobs.len(), "Job queued");
    Ok(id)
}
