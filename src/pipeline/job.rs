//! A unit of deferred forwarding work.

use axum::http::{request::Parts, HeaderMap, Method};

use crate::pipeline::buffer_pool::PooledBuffer;

/// A buffered request waiting to be dispatched to a backend.
///
/// The body buffer goes back to its pool when the job is dropped.
#[derive(Debug)]
pub struct Job {
    pub id: u64,
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: PooledBuffer,
}

impl Job {
    /// Build a job from the head of an inbound request and its staged body.
    pub fn new(id: u64, parts: Parts, body: PooledBuffer) -> Self {
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            id,
            method: parts.method,
            path_and_query,
            headers: parts.headers,
            body,
        }
    }
}
