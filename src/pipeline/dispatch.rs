//! Outbound dispatch of buffered jobs.
//!
//! # Responsibilities
//! - Pick a backend and rebuild the request from the job
//! - Enforce the per-call deadline
//! - Drain the response so the connection can return to the keep-alive pool
//! - Hand the body buffer back to the pool on every path
//!
//! # Design Decisions
//! - No retries and no dead-letter: a failed job is gone
//! - The outcome is returned so callers can count it, never surfaced to clients

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;

use crate::context::BalancerContext;
use crate::http::transport::Transport;
use crate::pipeline::job::Job;

/// Why a job was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to build outbound request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("failed to drain upstream response: {0}")]
    Body(#[from] hyper::Error),
    #[error("dispatch exceeded {0:?}")]
    Timeout(Duration),
}

impl DispatchError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::Request(_) => "request",
            DispatchError::Upstream(_) => "upstream",
            DispatchError::Body(_) => "body",
            DispatchError::Timeout(_) => "timeout",
        }
    }
}

/// Forward one job to the next backend in rotation.
///
/// Consumes the job; its buffer is released before this returns.
pub async fn dispatch(ctx: &BalancerContext, mut job: Job) -> Result<StatusCode, DispatchError> {
    let (index, endpoint) = ctx.registry.select();
    let uri = endpoint.target_uri(&job.path_and_query)?;

    tracing::trace!(job_id = job.id, backend = index, uri = %uri, "Dispatching job");

    let payload = job.body.freeze();
    let mut request = Request::builder().method(job.method.clone()).uri(uri);
    if let Some(headers) = request.headers_mut() {
        *headers = std::mem::take(&mut job.headers);
    }
    let request = match request.body(Body::from(payload.clone())) {
        Ok(request) => request,
        Err(e) => {
            job.body.restore(payload);
            return Err(e.into());
        }
    };

    let timeout = ctx.settings.dispatch_timeout();
    let outcome = match tokio::time::timeout(timeout, send_and_drain(&ctx.transport, request)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(timeout)),
    };

    if !job.body.restore(payload) {
        tracing::trace!(job_id = job.id, "Body still referenced after dispatch, buffer not recycled");
    }
    outcome
}

async fn send_and_drain(
    transport: &Transport,
    request: Request<Body>,
) -> Result<StatusCode, DispatchError> {
    let response = transport.request(request).await?;
    let status = response.status();

    let mut body = response.into_body();
    while let Some(frame) = body.frame().await {
        frame?;
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendList, BalancerConfig};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn context(backend: String, timeout_ms: u64) -> Arc<BalancerContext> {
        let mut config = BalancerConfig::default();
        config.backends = BackendList(vec![backend]);
        config.pipeline.dispatch_timeout_ms = timeout_ms;
        BalancerContext::build(&config).unwrap().0
    }

    fn job(ctx: &BalancerContext) -> Job {
        let (parts, ()) = Request::post("/payments")
            .header("host", "lb:9999")
            .body(())
            .unwrap()
            .into_parts();
        let mut body = ctx.buffers.acquire();
        body.extend_from_slice(b"ping");
        Job::new(ctx.next_job_id(), parts, body)
    }

    #[tokio::test]
    async fn unreachable_backend_drops_job_and_releases_buffer() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let ctx = context(format!("http://{addr}"), 2000);

        let outcome = dispatch(&ctx, job(&ctx)).await;

        assert!(matches!(outcome, Err(DispatchError::Upstream(_))));
        assert_eq!(ctx.buffers.acquired(), 1);
        assert_eq!(ctx.buffers.released(), 1);
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let ctx = context(format!("http://{addr}"), 100);

        let outcome = dispatch(&ctx, job(&ctx)).await;

        assert!(matches!(outcome, Err(DispatchError::Timeout(_))));
        assert_eq!(outcome.unwrap_err().reason(), "timeout");
        assert_eq!(ctx.buffers.outstanding(), 0);
        hold.abort();
    }
}
