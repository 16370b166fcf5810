//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the ingest and summary handlers
//! - Build the balancer context and start the worker pool
//! - Serve HTTP/1.1 and HTTP/2 connections from the bounded listener
//! - Enforce read (header), write (response) and idle timeouts

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::BalancerConfig;
use crate::context::BalancerContext;
use crate::http::{proxy, response};
use crate::lifecycle::StartupError;
use crate::net::{ConnectionTracker, IdleTimeoutStream, Listener, ListenerError};
use crate::observability::metrics;
use crate::pipeline::{self, WorkerPool};

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    context: Arc<BalancerContext>,
    workers: WorkerPool,
}

impl HttpServer {
    /// Build the context and start the worker pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: BalancerConfig) -> Result<Self, StartupError> {
        let (context, jobs) = BalancerContext::build(&config)?;
        let workers = WorkerPool::spawn(context.clone(), jobs);
        let router = Self::build_router(&config, context.clone());

        Ok(Self {
            router,
            config,
            context,
            workers,
        })
    }

    /// Build the Axum router with both routes.
    ///
    /// Only the proxied route carries the write timeout: an ingest call
    /// waiting on a full queue is backpressure, not a failure. Request
    /// metrics wrap the timeout so a 408 is counted like any other status.
    #[allow(deprecated)]
    fn build_router(config: &BalancerConfig, context: Arc<BalancerContext>) -> Router {
        let write_timeout = config.listener.write_timeout();

        Router::new()
            .route(
                &config.routes.ingest_path,
                post(ingest_handler)
                    .layer(middleware::from_fn_with_state("ingest", record_metrics)),
            )
            .route(
                &config.routes.summary_path,
                get(summary_handler)
                    .layer(TimeoutLayer::new(write_timeout))
                    .layer(middleware::from_fn_with_state("summary", record_metrics)),
            )
            .with_state(context)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections until `shutdown` fires.
    ///
    /// Returning does not wait for queued jobs or in-flight dispatches.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.listener.read_timeout());
        let builder = Arc::new(builder);

        let idle_timeout = self.config.listener.idle_timeout();
        let service = TowerToHyperService::new(self.router);
        let tracker = ConnectionTracker::new();

        loop {
            let (stream, peer, permit) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                    Err(e) => return Err(e),
                },
                _ = shutdown.recv() => break,
            };

            let guard = tracker.track(peer);
            let builder = builder.clone();
            let service = service.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let io = TokioIo::new(IdleTimeoutStream::new(stream, idle_timeout));
                if let Err(e) = builder.serve_connection(io, service).await {
                    tracing::debug!(
                        connection_id = %guard.id(),
                        peer = %guard.peer(),
                        error = %e,
                        "Connection ended with error"
                    );
                }
            });
        }

        self.workers.abort();
        let stats = self.context.stats.snapshot();
        tracing::info!(
            open_connections = tracker.active_count(),
            accepted_connections = tracker.accepted_count(),
            abandoned_jobs = stats.pending(),
            "HTTP server stopped"
        );
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Shared state, for inspection.
    pub fn context(&self) -> &Arc<BalancerContext> {
        &self.context
    }
}

/// Count and time every response on `route`, whichever layer produced it.
async fn record_metrics(
    State(route): State<&'static str>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

/// Write path: stage, queue, acknowledge.
async fn ingest_handler(
    State(ctx): State<Arc<BalancerContext>>,
    request: Request<Body>,
) -> Response {
    match pipeline::ingest(&ctx, request).await {
        Ok(_) => response::accepted(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to queue request");
            response::error(e.status(), e.to_string())
        }
    }
}

/// Read path: proxy synchronously to the next backend.
async fn summary_handler(
    State(ctx): State<Arc<BalancerContext>>,
    request: Request<Body>,
) -> Response {
    proxy::forward_sync(&ctx, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use crate::config::BackendList;
    use crate::pipeline::JobReceiver;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    /// Captures `(route, status)` labels of request counter registrations.
    #[derive(Default)]
    struct RequestLabels {
        seen: parking_lot::Mutex<Vec<(String, String)>>,
    }

    impl ::metrics::Recorder for RequestLabels {
        fn describe_counter(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }
        fn describe_gauge(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }
        fn describe_histogram(
            &self,
            _: ::metrics::KeyName,
            _: Option<::metrics::Unit>,
            _: ::metrics::SharedString,
        ) {
        }

        fn register_counter(
            &self,
            key: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Counter {
            if key.name() == "balancer_requests_total" {
                let label = |name: &str| {
                    key.labels()
                        .find(|label| label.key() == name)
                        .map(|label| label.value().to_string())
                        .unwrap_or_default()
                };
                self.seen.lock().push((label("route"), label("status")));
            }
            ::metrics::Counter::noop()
        }

        fn register_gauge(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(
            &self,
            _: &::metrics::Key,
            _: &::metrics::Metadata<'_>,
        ) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    fn router() -> (Router, Arc<BalancerContext>, JobReceiver) {
        let config = BalancerConfig::default();
        let (context, jobs) = BalancerContext::build(&config).unwrap();
        (HttpServer::build_router(&config, context.clone()), context, jobs)
    }

    fn request(method: Method, path: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn ingest_acknowledges_with_no_content() {
        let (router, context, _jobs) = router();

        let res = router
            .oneshot(request(Method::POST, "/payments", "ping"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(context.jobs.len(), 1);
        assert_eq!(context.stats.snapshot().enqueued, 1);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (router, _, _jobs) = router();
        let res = router.oneshot(request(Method::GET, "/other", "")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let (router, context, _jobs) = router();

        let res = router
            .clone()
            .oneshot(request(Method::GET, "/payments", ""))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let res = router
            .oneshot(request(Method::DELETE, "/payments-summary", ""))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(context.buffers.acquired(), 0);
    }

    #[tokio::test]
    async fn invalid_pipeline_settings_fail_construction() {
        let mut config = BalancerConfig::default();
        config.pipeline.queue_capacity = 0;
        assert!(matches!(HttpServer::new(config), Err(StartupError::Config(_))));
    }

    #[tokio::test]
    async fn ingest_responses_are_counted() {
        let (router, _, _jobs) = router();
        let recorder = RequestLabels::default();
        let _local = ::metrics::set_default_local_recorder(&recorder);

        let res = router
            .oneshot(request(Method::POST, "/payments", "ping"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(*recorder.seen.lock(), vec![("ingest".to_string(), "204".to_string())]);
    }

    #[tokio::test]
    async fn summary_timeout_is_counted() {
        // Accepts connections and never answers.
        let silent = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = silent.accept().await {
                held.push(socket);
            }
        });

        let mut config = BalancerConfig::default();
        config.backends = BackendList(vec![format!("http://{addr}")]);
        config.listener.write_timeout_secs = 1;
        let (context, _jobs) = BalancerContext::build(&config).unwrap();
        let router = HttpServer::build_router(&config, context);

        let recorder = RequestLabels::default();
        let _local = ::metrics::set_default_local_recorder(&recorder);

        let res = router
            .oneshot(request(Method::GET, "/payments-summary", ""))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(*recorder.seen.lock(), vec![("summary".to_string(), "408".to_string())]);
        hold.abort();
    }
}
