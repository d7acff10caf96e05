//! HTTP listener as a supervised service.
//!
//! # Responsibilities
//! - Bind the listener when `serve` starts (bind errors fail the run)
//! - Serve an Axum router with tracing and timeout middleware
//! - Drain in-flight requests on `shutdown`, bounded by its deadline
//!
//! An instance serves once: a second `serve` fails with [`AlreadyServed`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::{BoxError, DeadlineExceeded};
use crate::lifecycle::ShutdownContext;
use crate::service::Service;

/// `serve` was called again on an [`HttpService`] that already served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP service {0:?} was already served")]
pub struct AlreadyServed(pub String);

/// An Axum server bound to one address.
pub struct HttpService {
    id: String,
    address: SocketAddr,
    router: Router,
    local_addr: OnceLock<SocketAddr>,
    started: AtomicBool,
    /// Cancelled to ask the server to stop accepting and drain.
    stop: CancellationToken,
    /// Cancelled once `serve` has returned, for any reason.
    stopped: CancellationToken,
}

impl HttpService {
    pub fn new(id: impl Into<String>, address: SocketAddr, router: Router) -> Self {
        Self {
            id: id.into(),
            address,
            router,
            local_addr: OnceLock::new(),
            started: AtomicBool::new(false),
            stop: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    /// A server answering every GET with `body`.
    pub fn fixed_response(
        id: impl Into<String>,
        address: SocketAddr,
        body: impl Into<Arc<str>>,
        request_timeout: Duration,
    ) -> Self {
        let body: Arc<str> = body.into();
        let handler = move || {
            let body = body.clone();
            async move { body.to_string() }
        };

        let router = Router::new()
            .route("/", get(handler.clone()))
            .route("/{*path}", get(handler))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ))
            .layer(TraceLayer::new_for_http());

        Self::new(id, address, router)
    }

    /// Configured bind address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Address actually bound, once `serve` has bound the listener.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }
}

#[async_trait]
impl Service for HttpService {
    fn id(&self) -> &str {
        &self.id
    }

    async fn serve(&self) -> Result<(), BoxError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Box::new(AlreadyServed(self.id.clone())));
        }
        let _stopped = self.stopped.clone().drop_guard();

        let listener = TcpListener::bind(self.address).await?;
        let local_addr = listener.local_addr()?;
        let _ = self.local_addr.set(local_addr);

        tracing::info!(service = %self.id, address = %local_addr, "HTTP service listening");

        let stop = self.stop.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await?;

        tracing::info!(service = %self.id, "HTTP service stopped");
        Ok(())
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), BoxError> {
        tracing::debug!(
            service = %self.id,
            remaining = ?ctx.remaining(),
            "Draining HTTP connections"
        );
        self.stop.cancel();

        tokio::select! {
            _ = self.stopped.cancelled() => Ok(()),
            _ = ctx.cancelled() => {
                Err(Box::new(DeadlineExceeded(ctx.timeout().unwrap_or_default())))
            }
        }
    }
}
