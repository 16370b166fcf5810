//! Backend registry.
//!
//! # Responsibilities
//! - Hold the ordered, immutable list of backend endpoints
//! - Apply the load balancing strategy to pick one per call

use std::num::NonZeroUsize;

use crate::load_balancer::{
    backend::{BackendEndpoint, EndpointError},
    round_robin::RoundRobin,
    LoadBalancer,
};

/// Startup failures while building the registry. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("at least one backend is required")]
    Empty,
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Fixed set of backends plus the strategy that rotates through them.
#[derive(Debug)]
pub struct BackendRegistry {
    backends: Vec<BackendEndpoint>,
    len: NonZeroUsize,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendRegistry {
    /// Parse every address, failing on the first malformed one.
    pub fn from_addresses(addresses: &[String]) -> Result<Self, RegistryError> {
        let backends = addresses
            .iter()
            .map(|address| BackendEndpoint::parse(address))
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_balancer(backends, Box::new(RoundRobin::new()))
    }

    pub fn with_balancer(
        backends: Vec<BackendEndpoint>,
        balancer: Box<dyn LoadBalancer>,
    ) -> Result<Self, RegistryError> {
        let len = NonZeroUsize::new(backends.len()).ok_or(RegistryError::Empty)?;
        Ok(Self {
            backends,
            len,
            balancer,
        })
    }

    /// Select the next backend.
    pub fn select(&self) -> (usize, &BackendEndpoint) {
        let index = self.balancer.next_index(self.len);
        (index, &self.backends[index])
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn endpoints(&self) -> &[BackendEndpoint] {
        &self.backends
    }
}
