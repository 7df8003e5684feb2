//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (--backends, --port)
//!     → validation.rs (semantic checks)
//!     → LbConfig (validated, immutable)
//!     → consumed once to build the ServerPool
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend list is fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    HealthCheckConfig, LbConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, RetryConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
