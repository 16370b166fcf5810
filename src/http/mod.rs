//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum routing, timeouts)
//!     → GET <summary path>:  proxy.rs (select backend, forward, relay response)
//!     → POST <ingest path>:  pipeline::ingest (buffer, queue, 204)
//!     → response.rs (responses generated by the balancer itself)
//!
//! Outbound calls from both paths share transport.rs.
//! ```

pub mod proxy;
pub mod response;
pub mod server;
pub mod transport;

pub use proxy::{forward_sync, ForwardHandler};
pub use server::HttpServer;
pub use transport::Transport;
