//! Service contract consumed by the supervisor.
//!
//! # Data Flow
//! ```text
//! caller builds services (HttpService, custom impls)
//!     → wrapped into ServiceHandle (identity captured once)
//!     → handed to one worker each
//!     → worker spawns serve(), later calls shutdown(ShutdownContext)
//! ```
//!
//! # Design Decisions
//! - Object-safe async trait so heterogeneous services share one run
//! - `serve` takes `&self`: the serve task and the shutdown call hold the
//!   same `Arc` and the service coordinates the two internally
//! - Returning from `serve` is only meaningful on error

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::lifecycle::ShutdownContext;

pub use http::{AlreadyServed, HttpService};

/// A long-running unit supervised by a run.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Stable identifier used in log events and errors.
    fn id(&self) -> &str;

    /// Run the service until it fails or is asked to stop.
    ///
    /// An `Err` ends the whole supervised run. `Ok(())` without a prior
    /// shutdown request is not treated as completion.
    async fn serve(&self) -> Result<(), BoxError>;

    /// Stop the service.
    ///
    /// `ctx` carries the grace-period deadline, if any. Implementations should
    /// stop waiting once [`ShutdownContext::cancelled`] resolves; the
    /// supervisor reports a shutdown still pending at the deadline as failed.
    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), BoxError>;
}

/// One service as seen by its worker.
#[derive(Clone)]
pub struct ServiceHandle {
    id: String,
    service: Arc<dyn Service>,
}

impl ServiceHandle {
    pub fn new(service: Arc<dyn Service>) -> Self {
        Self {
            id: service.id().to_string(),
            service,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle").field("id", &self.id).finish()
    }
}
