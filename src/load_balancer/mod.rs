//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request needs a backend
//!     → registry.rs (fixed, ordered list of endpoints)
//!     → round_robin.rs (atomic cursor picks the next index)
//!     → backend.rs (endpoint builds the outbound URI)
//! ```
//!
//! # Design Decisions
//! - Registry is built once at startup and never mutated
//! - Selection is a pure counter: no health, weight, or failure input
//! - The cursor is the only mutable state and is lock-free

use std::fmt::Debug;
use std::num::NonZeroUsize;

pub mod backend;
pub mod registry;
pub mod round_robin;

pub use backend::{BackendEndpoint, EndpointError};
pub use registry::{BackendRegistry, RegistryError};
pub use round_robin::RoundRobin;

/// Backend selection strategy.
pub trait LoadBalancer: Debug + Send + Sync {
    /// Pick an index in `[0, len)`.
    fn next_index(&self, len: NonZeroUsize) -> usize;
}
