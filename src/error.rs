//! Error types returned by a supervised run.
//!
//! A run reports at most one error: the first failure observed by the
//! coordinator. The service's own error is kept as-is inside [`RunError`] so
//! callers can still inspect or downcast it.

use std::fmt;
use std::time::Duration;

/// Boxed error returned by service implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The lifecycle phase a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The service's `serve` call returned an error while running.
    Serve,
    /// The service's `shutdown` call failed or overran its deadline.
    Shutdown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Serve => f.write_str("serve"),
            Phase::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Failure of a single service, tagged with its identity and phase.
#[derive(Debug, thiserror::Error)]
#[error("service {service:?} {phase} failed: {cause}")]
pub struct RunError {
    service: String,
    phase: Phase,
    #[source]
    cause: BoxError,
}

impl RunError {
    pub(crate) fn new(service: impl Into<String>, phase: Phase, cause: BoxError) -> Self {
        Self {
            service: service.into(),
            phase,
            cause,
        }
    }

    /// Identity of the service that failed.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Phase the failure happened in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The error returned by the service, unchanged.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Attempt to view the underlying cause as a concrete error type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }

    /// True when the shutdown call was cut off by its deadline.
    pub fn is_deadline_exceeded(&self) -> bool {
        self.downcast_ref::<DeadlineExceeded>().is_some()
    }

    /// Consume the error and return the service's original error.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

/// A shutdown call did not return before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("shutdown deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// A service task panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service task panicked: {0}")]
pub struct ServicePanicked(pub String);

impl ServicePanicked {
    pub(crate) fn from_join_error(err: tokio::task::JoinError) -> Self {
        if !err.is_panic() {
            return Self(err.to_string());
        }

        let payload = err.into_panic();
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self(message)
    }
}
