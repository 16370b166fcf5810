//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → consumed once at startup to build the balancer context
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend list never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendList, BalancerConfig, ListenerConfig, ObservabilityConfig, PipelineConfig,
    RouteConfig, TransportConfig,
};
pub use validation::{validate_config, ValidationError};
