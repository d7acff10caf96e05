//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Run (coordinator.rs):
//!     Arm signals → spawn one worker per service → join all → first error
//!
//! Worker (worker.rs):
//!     Spawn serve → race serve failure vs cancellation → shutdown → outcome
//!
//! Shutdown (shutdown.rs):
//!     Fresh grace-period context → shutdown call bounded by deadline
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel the run's token
//!     Second signal, or any signal once disarmed → OS default action
//! ```
//!
//! # Design Decisions
//! - One cancellation token per run, child of the caller's token
//! - No ordering between services: start and stop are fully concurrent
//! - The first failure cancels every other service, related or not
//! - Shutdown has timeout: a shutdown still pending at the deadline fails

pub mod coordinator;
pub mod shutdown;
pub mod signals;
pub mod worker;

pub use coordinator::{run, run_with_context, Supervisor};
pub use shutdown::ShutdownContext;
pub use signals::SignalBridge;
pub use worker::WorkerState;
