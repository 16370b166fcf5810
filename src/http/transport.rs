//! Shared outbound HTTP transport.
//!
//! A single keep-alive connection pool serves every backend, for both the
//! synchronous proxy path and the asynchronous dispatch path.

use std::time::Duration;

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::TransportConfig;

/// Pooled HTTP/1.1 client. Cloning shares the pool.
pub type Transport = Client<HttpConnector, Body>;

/// Build the shared client from configuration.
pub fn build(config: &TransportConfig) -> Transport {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .build(connector)
}
