//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address, connection timeouts).
    pub listener: ListenerConfig,

    /// Backend base addresses, in selection order.
    pub backends: BackendList,

    /// Paths of the two exposed routes.
    pub routes: RouteConfig,

    /// Asynchronous ingestion pipeline settings.
    pub pipeline: PipelineConfig,

    /// Shared outbound transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ordered list of backend addresses (e.g. `http://api1:8080`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BackendList(pub Vec<String>);

impl Default for BackendList {
    fn default() -> Self {
        Self(vec![
            "http://api1:8080".to_string(),
            "http://api2:8080".to_string(),
        ])
    }
}

impl BackendList {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9999").
    pub bind_address: String,

    /// Deadline for a client to transmit request headers, in seconds.
    pub read_timeout_secs: u64,

    /// Deadline for producing a response once a request is read, in seconds.
    pub write_timeout_secs: u64,

    /// Close connections with no I/O progress for this long, in seconds.
    pub idle_timeout_secs: u64,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9999".to_string(),
            read_timeout_secs: 5,
            write_timeout_secs: 5,
            idle_timeout_secs: 120,
            max_connections: 10_000,
        }
    }
}

impl ListenerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Paths of the ingest (POST) and summary (GET) routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Buffered, fire-and-forget write path.
    pub ingest_path: String,

    /// Synchronously proxied read path.
    pub summary_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            ingest_path: "/payments".to_string(),
            summary_path: "/payments-summary".to_string(),
        }
    }
}

/// Asynchronous ingestion pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the bounded job queue.
    pub queue_capacity: usize,

    /// Number of long-lived dequeue loops.
    pub workers: usize,

    /// Per-call deadline for an outbound dispatch, in milliseconds.
    pub dispatch_timeout_ms: u64,

    /// Initial capacity of freshly allocated staging buffers, in bytes.
    pub buffer_capacity: usize,

    /// Most returned buffers kept on the free list for reuse.
    pub max_idle_buffers: usize,

    /// Cap on concurrently running dispatches. 0 leaves fan-out unbounded.
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            workers: 16,
            dispatch_timeout_ms: 5000,
            buffer_capacity: 1024,
            max_idle_buffers: 1024,
            max_in_flight: 0,
        }
    }
}

impl PipelineConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

/// Shared outbound connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Maximum idle keep-alive connections kept per backend.
    pub max_idle_per_host: usize,

    /// Idle keep-alive connections are closed after this many seconds.
    pub idle_timeout_secs: u64,

    /// TCP connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 128,
            idle_timeout_secs: 90,
            connect_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
