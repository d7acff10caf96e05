//! Grace period handed to a service's shutdown call.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{BoxError, DeadlineExceeded};
use crate::service::Service;

/// Deadline context for one `Service::shutdown` call.
///
/// Created when the shutdown begins, independently of the run's cancellation
/// token: the run being cancelled must not also cancel the grace period.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownContext {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl ShutdownContext {
    /// A context without deadline; shutdown may take as long as it needs.
    pub fn unbounded() -> Self {
        Self {
            timeout: None,
            deadline: None,
        }
    }

    /// A context expiring `timeout` from now. A zero timeout means unbounded.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_timeout(Some(timeout))
    }

    pub(crate) fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout.filter(|t| !t.is_zero()) {
            Some(t) => Self {
                timeout: Some(t),
                deadline: Some(Instant::now() + t),
            },
            None => Self::unbounded(),
        }
    }

    /// The configured grace period, if bounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The instant the grace period ends, if bounded.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the deadline passes. Never resolves when unbounded.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for ShutdownContext {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Call `service.shutdown`, failing with [`DeadlineExceeded`] if it is still
/// pending when the context's deadline passes.
pub(crate) async fn shutdown_within(
    service: &dyn Service,
    ctx: ShutdownContext,
) -> Result<(), BoxError> {
    match (ctx.deadline(), ctx.timeout()) {
        (Some(deadline), Some(timeout)) => {
            match tokio::time::timeout_at(deadline, service.shutdown(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(Box::new(DeadlineExceeded(timeout))),
            }
        }
        _ => service.shutdown(ctx).await,
    }
}
