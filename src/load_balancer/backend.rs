//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend's base address
//! - Validate the address once, at startup
//! - Build outbound URIs from an inbound path and query

use std::fmt;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use url::Url;

/// Reasons a backend address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("malformed backend address `{address}`: {reason}")]
    Malformed { address: String, reason: String },
    #[error("unsupported scheme `{scheme}` in `{address}` (only http is supported)")]
    UnsupportedScheme { address: String, scheme: String },
}

/// An immutable backend address: scheme, host, port and optional base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    authority: Authority,
    base_path: String,
}

impl BackendEndpoint {
    /// Parse a base address such as `http://api1:8080`.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let malformed = |reason: String| EndpointError::Malformed {
            address: address.to_string(),
            reason,
        };

        let url = Url::parse(address).map_err(|e| malformed(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(EndpointError::UnsupportedScheme {
                address: address.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .ok_or_else(|| malformed("missing host".to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let authority = Authority::try_from(format!("{host}:{port}"))
            .map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// `host:port` of the backend.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Join the base address with an inbound `path?query`.
    pub fn target_uri(&self, path_and_query: &str) -> Result<Uri, axum::http::Error> {
        let mut target = String::with_capacity(self.base_path.len() + path_and_query.len() + 1);
        target.push_str(&self.base_path);
        if !path_and_query.starts_with('/') {
            target.push('/');
        }
        target.push_str(path_and_query);

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(target)
            .build()
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}{}", self.authority, self.base_path)
    }
}
