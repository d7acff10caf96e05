//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! workers / coordinator
//!     → events.rs (LifecycleEvent per state change)
//!     → logging.rs (LogSink: noop, callbacks, tracing)
//!
//! internal diagnostics
//!     → tracing macros directly
//! ```

pub mod events;
pub mod logging;

pub use events::LifecycleEvent;
pub use logging::{init_tracing, FnSink, LogFn, LogSink, NoopSink, TracingSink};
