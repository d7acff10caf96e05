//! Concurrent lifecycle supervisor for long-running services.
//!
//! Every service is started at once. The run ends when a shutdown signal
//! arrives, the caller's token is cancelled, or the first service fails; the
//! remaining services are then shut down concurrently under an optional
//! deadline and the first failure is returned.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod service;

pub use config::{Options, RunConfig};
pub use error::{BoxError, DeadlineExceeded, Phase, RunError, ServicePanicked};
pub use lifecycle::{run, run_with_context, ShutdownContext, SignalBridge, Supervisor};
pub use observability::{LifecycleEvent, LogFn, LogSink};
pub use service::{AlreadyServed, HttpService, Service, ServiceHandle};
pub use tokio_util::sync::CancellationToken;
