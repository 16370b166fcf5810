//! Round-robin HTTP load balancer with a buffered, fire-and-forget write path.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!   GET  summary  │  http::server ──▶ http::proxy ──▶ load_balancer ─────────┼──▶ backend (sync)
//!                 │                                                          │
//!   POST ingest   │  http::server ──▶ pipeline::ingest ──▶ pipeline::queue   │
//!   ◀── 204 ──────┤                                           │              │
//!                 │                     pipeline::worker ◀────┘              │
//!                 │                           │ spawn                        │
//!                 │                     pipeline::dispatch ──────────────────┼──▶ backend (async)
//!                 └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod pipeline;

pub use config::schema::BalancerConfig;
pub use context::BalancerContext;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
