//! Synchronous forwarding (read path).
//!
//! # Responsibilities
//! - Rewrite the inbound URI onto the selected backend
//! - Forward method, headers and body unchanged (including `Host`)
//! - Stream the backend response back unchanged
//! - Map transport failures to 502 without affecting other requests

use axum::body::Body;
use axum::http::{Request, Version};
use axum::response::Response;

use crate::context::BalancerContext;
use crate::http::response;
use crate::http::transport::Transport;
use crate::load_balancer::BackendEndpoint;

/// Forwarding handler bound to one backend.
#[derive(Debug, Clone)]
pub struct ForwardHandler {
    endpoint: BackendEndpoint,
    client: Transport,
}

impl ForwardHandler {
    pub fn new(endpoint: BackendEndpoint, client: Transport) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    /// Proxy one request to this backend and relay its response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        parts.uri = match self.endpoint.target_uri(path_and_query) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(backend = %self.endpoint, error = %e, "Failed to build upstream URI");
                return response::bad_gateway();
            }
        };
        // The shared transport speaks HTTP/1.1 to backends.
        parts.version = Version::HTTP_11;

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(upstream) => {
                let (parts, body) = upstream.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(backend = %self.endpoint, error = %e, "Upstream error");
                response::bad_gateway()
            }
        }
    }
}

/// Select a backend and proxy the request to it.
pub async fn forward_sync(ctx: &BalancerContext, request: Request<Body>) -> Response {
    let (index, endpoint) = ctx.registry.select();
    tracing::debug!(
        backend = %endpoint,
        method = %request.method(),
        path = %request.uri().path(),
        "Proxying request"
    );
    ctx.forwarders[index].forward(request).await
}
