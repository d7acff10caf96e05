//! Structured logging.
//!
//! # Responsibilities
//! - Define the sink that observes lifecycle events
//! - Provide the no-op, callback and `tracing` sinks
//! - Initialize the `tracing` subscriber for the binary
//!
//! # Design Decisions
//! - Missing hooks resolve to `NoopSink` when options are built, so the
//!   core never checks whether logging is configured
//! - Internal diagnostics always go through `tracing`; the sink only sees
//!   the lifecycle events

use std::fmt;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::events::LifecycleEvent;

/// Log callback: message plus structured key/value attributes.
pub type LogFn = Arc<dyn Fn(&str, &[(&'static str, String)]) + Send + Sync>;

/// Observer of lifecycle events.
pub trait LogSink: Send + Sync {
    fn record(&self, event: &LifecycleEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn record(&self, _event: &LifecycleEvent) {}
}

/// Sink forwarding events to an info and an error callback by level.
#[derive(Clone)]
pub struct FnSink {
    info: LogFn,
    error: LogFn,
}

impl FnSink {
    pub fn new(info: LogFn, error: LogFn) -> Self {
        Self { info, error }
    }
}

impl fmt::Debug for FnSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

impl LogSink for FnSink {
    fn record(&self, event: &LifecycleEvent) {
        let fields = event.fields();
        if event.level() == Level::ERROR {
            (self.error)(event.message(), &fields);
        } else {
            (self.info)(event.message(), &fields);
        }
    }
}

/// Sink emitting lifecycle events as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, event: &LifecycleEvent) {
        let message = event.message();
        match event {
            LifecycleEvent::ServiceStarting { service }
            | LifecycleEvent::ShutdownSucceeded { service } => {
                tracing::info!(service = %service, "{}", message);
            }
            LifecycleEvent::ServeFailed { service, cause }
            | LifecycleEvent::ShutdownFailed { service, cause } => {
                tracing::error!(service = %service, cause = %cause, "{}", message);
            }
            LifecycleEvent::AllServicesStopped => {
                tracing::info!("{}", message);
            }
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "service_supervisor=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
