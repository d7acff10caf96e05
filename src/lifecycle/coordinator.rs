//! Run coordination: fan out one worker per service, join them, keep the
//! first error.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{Options, RunConfig};
use crate::error::{Phase, RunError, ServicePanicked};
use crate::lifecycle::signals::SignalBridge;
use crate::lifecycle::worker::Worker;
use crate::observability::LifecycleEvent;
use crate::service::Service;

/// Supervise `services` until a shutdown signal or the first failure.
///
/// Returns the first error observed, or `Ok(())` when every service shut
/// down cleanly.
///
/// Dropping the returned future before it completes cancels the run: the
/// workers are detached and still shut their services down in the
/// background, but nobody observes their outcome.
pub async fn run<I>(services: I, options: Options) -> Result<(), RunError>
where
    I: IntoIterator<Item = Arc<dyn Service>>,
{
    run_with_context(CancellationToken::new(), services, options).await
}

/// Like [`run`], additionally stopping when `parent` is cancelled.
pub async fn run_with_context<I>(
    parent: CancellationToken,
    services: I,
    options: Options,
) -> Result<(), RunError>
where
    I: IntoIterator<Item = Arc<dyn Service>>,
{
    let config = Arc::new(RunConfig::new(services, options));
    coordinate(&parent, config).await
}

/// Options bound once, reusable for any number of runs.
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    options: Options,
}

impl Supervisor {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run<I>(&self, services: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = Arc<dyn Service>>,
    {
        run(services, self.options.clone()).await
    }

    pub async fn run_with_context<I>(
        &self,
        parent: CancellationToken,
        services: I,
    ) -> Result<(), RunError>
    where
        I: IntoIterator<Item = Arc<dyn Service>>,
    {
        run_with_context(parent, services, self.options.clone()).await
    }
}

async fn coordinate(parent: &CancellationToken, config: Arc<RunConfig>) -> Result<(), RunError> {
    // Dropped on every exit path, which unregisters the signal listener.
    let bridge = SignalBridge::arm(parent, config.force_exit_on_second_signal());
    let ctx = bridge.token().clone();

    tracing::info!(
        service_count = config.services().len(),
        shutdown_timeout = ?config.shutdown_timeout(),
        "Starting services"
    );

    let mut workers = Workers::new(ctx.clone());
    let mut ids = HashMap::new();
    for handle in config.services() {
        let worker = Worker::new(handle.clone(), Arc::clone(&config));
        let task = workers.set.spawn(worker.run(ctx.clone()));
        ids.insert(task.id(), handle.id().to_string());
    }

    let mut first_error: Option<RunError> = None;
    while let Some(joined) = workers.set.join_next_with_id().await {
        let outcome = match joined {
            Ok((_, outcome)) => outcome,
            Err(e) => {
                let service = ids.get(&e.id()).cloned().unwrap_or_default();
                let cause = ServicePanicked::from_join_error(e);
                config.sink().record(&LifecycleEvent::ShutdownFailed {
                    service: service.clone(),
                    cause: cause.to_string(),
                });
                Err(RunError::new(service, Phase::Shutdown, Box::new(cause)))
            }
        };

        let Err(err) = outcome else {
            continue;
        };

        if first_error.is_none() {
            tracing::info!(
                service = %err.service(),
                phase = %err.phase(),
                "Service failed, stopping remaining services"
            );
            ctx.cancel();
            first_error = Some(err);
        } else {
            tracing::warn!(
                service = %err.service(),
                error = %err,
                "Additional service failure while stopping"
            );
        }
    }

    drop(bridge);

    match first_error {
        Some(err) => Err(err),
        None => {
            config.sink().record(&LifecycleEvent::AllServicesStopped);
            Ok(())
        }
    }
}

/// Worker tasks of one run.
///
/// If the run is dropped while workers are live, they are cancelled and
/// detached instead of aborted, so every service still gets its shutdown.
struct Workers {
    set: JoinSet<Result<(), RunError>>,
    ctx: CancellationToken,
}

impl Workers {
    fn new(ctx: CancellationToken) -> Self {
        Self {
            set: JoinSet::new(),
            ctx,
        }
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        if self.set.is_empty() {
            return;
        }
        tracing::warn!(
            workers = self.set.len(),
            "Run dropped before completion, shutting services down in the background"
        );
        self.ctx.cancel();
        self.set.detach_all();
    }
}
