//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use service_supervisor::{BoxError, LifecycleEvent, LogSink, Service, ShutdownContext};
use tokio_util::sync::CancellationToken;

/// What a mock service's `serve` does.
#[derive(Clone)]
pub enum ServeBehavior {
    /// Run until shutdown is called.
    UntilStopped,
    /// Fail with the message after the delay, unless stopped first.
    FailAfter(Duration, &'static str),
    /// Return `Ok(())` after the delay.
    ReturnOkAfter(Duration),
    /// Run until shutdown is called, then fail with the message after the delay.
    FailAfterStop(Duration, &'static str),
    /// Panic straight away.
    Panic,
}

/// Scriptable service counting its shutdown calls.
pub struct MockService {
    id: String,
    serve: ServeBehavior,
    shutdown_delay: Duration,
    shutdown_error: Option<&'static str>,
    stop: CancellationToken,
    serve_finished: CancellationToken,
    shutdown_calls: AtomicUsize,
}

impl MockService {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            serve: ServeBehavior::UntilStopped,
            shutdown_delay: Duration::ZERO,
            shutdown_error: None,
            stop: CancellationToken::new(),
            serve_finished: CancellationToken::new(),
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    pub fn serve_behavior(mut self, behavior: ServeBehavior) -> Self {
        self.serve = behavior;
        self
    }

    pub fn shutdown_delay(mut self, delay: Duration) -> Self {
        self.shutdown_delay = delay;
        self
    }

    pub fn shutdown_error(mut self, message: &'static str) -> Self {
        self.shutdown_error = Some(message);
        self
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    /// Resolves once a `FailAfterStop` serve has produced its error.
    pub async fn serve_finished(&self) {
        self.serve_finished.cancelled().await;
    }
}

#[async_trait]
impl Service for MockService {
    fn id(&self) -> &str {
        &self.id
    }

    async fn serve(&self) -> Result<(), BoxError> {
        match self.serve.clone() {
            ServeBehavior::UntilStopped => {
                self.stop.cancelled().await;
                Ok(())
            }
            ServeBehavior::FailAfter(delay, message) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Err(message.into()),
                    _ = self.stop.cancelled() => Ok(()),
                }
            }
            ServeBehavior::ReturnOkAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            ServeBehavior::FailAfterStop(delay, message) => {
                self.stop.cancelled().await;
                tokio::time::sleep(delay).await;
                self.serve_finished.cancel();
                Err(message.into())
            }
            ServeBehavior::Panic => panic!("serve exploded"),
        }
    }

    async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), BoxError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.shutdown_delay).await;
        self.stop.cancel();
        match self.shutdown_error {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }
}

/// Wraps any service and counts calls to `shutdown`.
pub struct Counted<S> {
    inner: S,
    shutdown_calls: AtomicUsize,
}

impl<S> Counted<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Service> Service for Counted<S> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn serve(&self) -> Result<(), BoxError> {
        self.inner.serve().await
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), BoxError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.shutdown(ctx).await
    }
}

/// Sink keeping every event in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, service: &str) -> Vec<LifecycleEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.service() == Some(service))
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn record(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn services<const N: usize>(list: [Arc<dyn Service>; N]) -> Vec<Arc<dyn Service>> {
    list.into_iter().collect()
}
