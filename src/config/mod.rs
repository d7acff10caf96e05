//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! library callers:
//!     Options builder (timeout, log hooks, sink)
//!     → RunConfig (services + options, immutable)
//!     → shared via Arc to all workers
//!
//! binary:
//!     config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig → Options + HttpService list
//! ```
//!
//! # Design Decisions
//! - RunConfig is fixed before a run starts and never mutated
//! - Options have no validation error: inapplicable settings are ignored
//! - File fields all have defaults to allow minimal configs

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use options::{Options, RunConfig};
pub use schema::{HttpServiceConfig, SupervisorConfig};
