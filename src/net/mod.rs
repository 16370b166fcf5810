//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → idle.rs (close connections without I/O progress)
//!     → connection.rs (lifecycle tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked for logs and metrics
//! - TLS is terminated in front of the balancer, never here

pub mod connection;
pub mod idle;
pub mod listener;

pub use connection::ConnectionTracker;
pub use idle::IdleTimeoutStream;
pub use listener::{Listener, ListenerError};
