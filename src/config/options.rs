//! Run options and the resolved per-run configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::{FnSink, LogFn, LogSink, NoopSink, TracingSink};
use crate::service::{Service, ServiceHandle};

/// Options shared by every service of a run.
///
/// There is no validation step: settings that cannot apply (a log hook given
/// without its counterpart) are ignored.
#[derive(Clone)]
pub struct Options {
    shutdown_timeout: Option<Duration>,
    sink: Arc<dyn LogSink>,
    force_exit_on_second_signal: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            shutdown_timeout: None,
            sink: Arc::new(NoopSink),
            force_exit_on_second_signal: true,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach info and error log callbacks. Ignored unless both are present.
    pub fn log_funcs(mut self, info: Option<LogFn>, error: Option<LogFn>) -> Self {
        if let (Some(info), Some(error)) = (info, error) {
            self.sink = Arc::new(FnSink::new(info, error));
        }
        self
    }

    /// Report lifecycle events to a custom sink.
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Report lifecycle events as `tracing` events.
    pub fn tracing(self) -> Self {
        self.sink(Arc::new(TracingSink))
    }

    /// Bound every service's shutdown call. Zero means unbounded.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Let a second SIGINT/SIGTERM received during shutdown take its default
    /// action and terminate the process (default: enabled). When disabled,
    /// further signals are absorbed until the run returns.
    pub fn force_exit_on_second_signal(mut self, enabled: bool) -> Self {
        self.force_exit_on_second_signal = enabled;
        self
    }

    pub fn get_shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }

    pub fn get_force_exit_on_second_signal(&self) -> bool {
        self.force_exit_on_second_signal
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("force_exit_on_second_signal", &self.force_exit_on_second_signal)
            .finish_non_exhaustive()
    }
}

/// Everything one run needs, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    services: Vec<ServiceHandle>,
    options: Options,
}

impl RunConfig {
    pub fn new<I>(services: I, options: Options) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Service>>,
    {
        Self {
            services: services.into_iter().map(ServiceHandle::new).collect(),
            options,
        }
    }

    /// Services in the order they were given.
    pub fn services(&self) -> &[ServiceHandle] {
        &self.services
    }

    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.options.shutdown_timeout
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.options.sink.as_ref()
    }

    pub fn force_exit_on_second_signal(&self) -> bool {
        self.options.force_exit_on_second_signal
    }
}
