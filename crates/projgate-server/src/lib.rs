//! projgate-server: Configuration and service wiring
//!
//! This crate connects the storage layer to the access resolver:
//! - Configuration management (YAML file + environment overrides)
//! - Structured logging initialisation
//! - Adapter implementing the domain `AccessReader` over a `DataStore`
//! - `ProjectAccessService`, the entry point for project listings and
//!   authorization middleware, with optional caching and invalidation hooks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               projgate-server               │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  logging.rs  - tracing-subscriber setup     │
//! │  adapters.rs - DataStore -> AccessReader    │
//! │  service.rs  - ProjectAccessService         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod logging;
pub mod service;

// Re-exports for convenience
pub use adapters::DataStoreAccessReader;
pub use config::{ConfigLoadError, ServerConfig};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use service::ProjectAccessService;
