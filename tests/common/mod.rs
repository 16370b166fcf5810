//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ingest_balancer::config::{BackendList, BalancerConfig};
use ingest_balancer::net::Listener;
use ingest_balancer::{BalancerContext, HttpServer, Shutdown};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub backend: &'static str,
    pub method: String,
    pub path_and_query: String,
    pub host: Option<String>,
    pub body: Bytes,
}

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub requests: mpsc::UnboundedReceiver<Recorded>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for the next recorded request.
    pub async fn next_request(&mut self, within: Duration) -> Option<Recorded> {
        tokio::time::timeout(within, self.requests.recv()).await.ok().flatten()
    }
}

struct MockState<F> {
    name: &'static str,
    tx: mpsc::UnboundedSender<Recorded>,
    respond: Arc<F>,
}

impl<F> Clone for MockState<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            respond: self.respond.clone(),
        }
    }
}

/// Start a mock backend that answers every request with `200 <name>`.
pub async fn start_mock_backend(name: &'static str) -> MockBackend {
    start_programmable_backend(name, move || async move { (200, name.to_string()) }).await
}

/// Start a mock backend whose status and body come from `respond`.
pub async fn start_programmable_backend<F, Fut>(name: &'static str, respond: F) -> MockBackend
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let (tx, requests) = mpsc::unbounded_channel();
    let state = MockState {
        name,
        tx,
        respond: Arc::new(respond),
    };
    let app = Router::new().fallback(record_and_respond::<F, Fut>).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, requests }
}

async fn record_and_respond<F, Fut>(
    State(state): State<MockState<F>>,
    request: Request<Body>,
) -> impl IntoResponse
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let respond = state.respond.as_ref();
    let (status, reply) = respond().await;

    let _ = state.tx.send(Recorded {
        backend: state.name,
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        host: parts
            .headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    (
        StatusCode::from_u16(status).unwrap(),
        [("x-backend", state.name)],
        reply,
    )
}

/// An address with nothing listening on it.
pub async fn unreachable_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap()
}

/// A running balancer.
pub struct Balancer {
    pub addr: SocketAddr,
    pub context: Arc<BalancerContext>,
    pub shutdown: Shutdown,
}

impl Balancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Poll until every queued job has been delivered or dropped.
    pub async fn wait_for_settled(&self, jobs: u64, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            let stats = self.context.stats.snapshot();
            if stats.delivered + stats.dropped >= jobs {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Start a balancer on an ephemeral port in front of `backends`.
pub async fn start_balancer(
    backends: Vec<String>,
    tweak: impl FnOnce(&mut BalancerConfig),
) -> Balancer {
    let mut config = BalancerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backends = BackendList(backends);
    tweak(&mut config);

    let server = HttpServer::new(config).unwrap();
    let listener = Listener::bind(&server.config().listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let context = server.context().clone();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Balancer {
        addr,
        context,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
