//! Per-service worker.
//!
//! # States
//! - Starting: serve task not spawned yet
//! - Running: serve task live, waiting for failure or cancellation
//! - ServeFailed: serve returned an error
//! - ShuttingDown: run cancelled, shutdown call in progress
//! - Terminated: outcome produced
//!
//! # State Transitions
//! ```text
//! Starting → Running: serve task spawned
//! Running → ServeFailed: serve returned Err (or panicked)
//! Running → ShuttingDown: shared token cancelled
//! ServeFailed | ShuttingDown → Terminated
//! ```
//!
//! # Design Decisions
//! - The serve task's JoinHandle is the completion slot: a result nobody
//!   waits for is dropped with the handle, the task never blocks on it
//! - serve returning Ok while the run is live does not terminate the worker;
//!   it keeps waiting for cancellation
//! - The serve task is detached, not aborted, once shutdown completes

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::error::{BoxError, Phase, RunError, ServicePanicked};
use crate::lifecycle::shutdown::{shutdown_within, ShutdownContext};
use crate::observability::LifecycleEvent;
use crate::service::ServiceHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Running,
    ServeFailed,
    ShuttingDown,
    Terminated,
}

/// Drives one service from start to its single outcome.
pub(crate) struct Worker {
    handle: ServiceHandle,
    config: Arc<RunConfig>,
    state: WorkerState,
}

impl Worker {
    pub(crate) fn new(handle: ServiceHandle, config: Arc<RunConfig>) -> Self {
        Self {
            handle,
            config,
            state: WorkerState::Starting,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        tracing::debug!(
            service = %self.handle.id(),
            from = ?self.state,
            to = ?next,
            "Worker state change"
        );
        self.state = next;
    }

    fn record(&self, event: LifecycleEvent) {
        self.config.sink().record(&event);
    }

    /// Run the service until it fails or `ctx` is cancelled, then shut it down.
    pub(crate) async fn run(mut self, ctx: CancellationToken) -> Result<(), RunError> {
        let id = self.handle.id().to_string();

        self.record(LifecycleEvent::ServiceStarting {
            service: id.clone(),
        });
        let service = Arc::clone(self.handle.service());
        let mut serve = tokio::spawn(async move { service.serve().await });
        self.transition(WorkerState::Running);

        let mut serve_returned = false;
        loop {
            tokio::select! {
                joined = &mut serve, if !serve_returned => {
                    let cause: BoxError = match joined {
                        Ok(Ok(())) => {
                            serve_returned = true;
                            tracing::debug!(
                                service = %id,
                                "Serve returned without error, waiting for shutdown request"
                            );
                            continue;
                        }
                        Ok(Err(e)) => e,
                        Err(e) => Box::new(ServicePanicked::from_join_error(e)),
                    };

                    self.transition(WorkerState::ServeFailed);
                    self.record(LifecycleEvent::ServeFailed {
                        service: id.clone(),
                        cause: cause.to_string(),
                    });
                    self.transition(WorkerState::Terminated);
                    return Err(RunError::new(id, Phase::Serve, cause));
                }
                _ = ctx.cancelled() => break,
            }
        }

        self.transition(WorkerState::ShuttingDown);
        let shutdown_ctx = ShutdownContext::from_timeout(self.config.shutdown_timeout());
        let result = shutdown_within(self.handle.service().as_ref(), shutdown_ctx).await;
        self.transition(WorkerState::Terminated);

        match result {
            Ok(()) => {
                self.record(LifecycleEvent::ShutdownSucceeded { service: id });
                Ok(())
            }
            Err(cause) => {
                self.record(LifecycleEvent::ShutdownFailed {
                    service: id.clone(),
                    cause: cause.to_string(),
                });
                Err(RunError::new(id, Phase::Shutdown, cause))
            }
        }
    }
}
