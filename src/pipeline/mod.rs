//! Asynchronous ingestion pipeline.
//!
//! # Data Flow
//! ```text
//! POST <ingest path>
//!     → ingest.rs (copy body into a pooled buffer, build Job)
//!     → queue.rs (bounded FIFO, waits when full)
//!     → 204 to the client
//!
//! worker.rs (W loops)
//!     → dequeue Job
//!     → spawn dispatch.rs (select backend, send, drain, release buffer)
//!     → stats.rs (delivered / dropped)
//! ```
//!
//! # Design Decisions
//! - The queue is the only backpressure on the write path
//! - Jobs are not cancellable once queued and are lost on shutdown
//! - Failures are counted and logged, never retried

pub mod buffer_pool;
pub mod dispatch;
pub mod ingest;
pub mod job;
pub mod queue;
pub mod stats;
pub mod worker;

pub use buffer_pool::{BufferPool, PooledBuffer};
pub use dispatch::{dispatch, DispatchError};
pub use ingest::{ingest, IngestError};
pub use job::Job;
pub use queue::{bounded, JobReceiver, JobSender, QueueClosed};
pub use stats::{PipelineStats, StatsSnapshot};
pub use worker::WorkerPool;
