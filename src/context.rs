//! Shared balancer state.
//!
//! Everything mutable that request handlers and workers share lives here:
//! the selection cursor (inside the registry), the buffer pool, the job queue
//! and the outcome counters. Built once at startup and passed around as
//! `Arc<BalancerContext>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::{validate_config, BalancerConfig, ConfigError, PipelineConfig};
use crate::http::proxy::ForwardHandler;
use crate::http::transport::{self, Transport};
use crate::lifecycle::startup::StartupError;
use crate::load_balancer::BackendRegistry;
use crate::pipeline::{self, BufferPool, JobReceiver, JobSender, PipelineStats};

#[derive(Debug)]
pub struct BalancerContext {
    /// Fixed backend list plus round-robin cursor.
    pub registry: BackendRegistry,
    /// One forwarding handler per backend, index-aligned with `registry`.
    pub forwarders: Vec<ForwardHandler>,
    /// Outbound connection pool shared by every backend and both paths.
    pub transport: Transport,
    pub buffers: Arc<BufferPool>,
    pub jobs: JobSender,
    pub stats: PipelineStats,
    pub settings: PipelineConfig,
    job_ids: AtomicU64,
}

impl BalancerContext {
    /// Build the context. Fails on any configuration error, including a
    /// malformed or empty backend list.
    ///
    /// The returned receiver is the consumer end of the job queue; nothing
    /// is dispatched until it is handed to a worker pool.
    pub fn build(config: &BalancerConfig) -> Result<(Arc<Self>, JobReceiver), StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let registry = BackendRegistry::from_addresses(config.backends.as_slice())?;
        let transport = transport::build(&config.transport);
        let forwarders = registry
            .endpoints()
            .iter()
            .map(|endpoint| ForwardHandler::new(endpoint.clone(), transport.clone()))
            .collect();
        let (jobs, receiver) = pipeline::bounded(config.pipeline.queue_capacity);

        for (index, endpoint) in registry.endpoints().iter().enumerate() {
            tracing::info!(index, backend = %endpoint, "Backend registered");
        }

        let ctx = Self {
            registry,
            forwarders,
            transport,
            buffers: BufferPool::new(
                config.pipeline.buffer_capacity,
                config.pipeline.max_idle_buffers,
            ),
            jobs,
            stats: PipelineStats::default(),
            settings: config.pipeline.clone(),
            job_ids: AtomicU64::new(0),
        };
        Ok((Arc::new(ctx), receiver))
    }

    pub fn next_job_id(&self) -> u64 {
        self.job_ids.fetch_add(1, Ordering::Relaxed)
    }
}
