//! OS signal handling.
//!
//! # Responsibilities
//! - Watch SIGINT and SIGTERM (Ctrl+C elsewhere)
//! - Cancel the run's token on the first signal
//! - Hand further signals back to their default action once released
//!
//! # Design Decisions
//! - Signals are registered before `arm` returns so no signal sent after
//!   arming can be missed
//! - Disarm is `Drop`: the bridge releases its claim, closes its signal
//!   stream and aborts the listener on every exit path
//! - While no bridge holds a claim, SIGINT/SIGTERM take the default action
//!   (the process dies by that signal); the library never exits on its own
//! - A failed registration is logged and that signal is left unwatched

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Signal that triggered a shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Interrupt,
    Terminate,
}

impl fmt::Display for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Received::Interrupt => f.write_str("SIGINT"),
            Received::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Cancellation token armed to fire on the first shutdown signal.
///
/// The token is a child of the caller's token: cancelling the parent cancels
/// it too, cancelling it never touches the parent.
pub struct SignalBridge {
    token: CancellationToken,
    claim: Arc<Claim>,
    closer: Closer,
    listener: JoinHandle<()>,
}

impl SignalBridge {
    /// Derive a child of `parent` that is cancelled on SIGINT/SIGTERM.
    ///
    /// With `release_on_first_signal`, the bridge stops absorbing signals as
    /// soon as the first one arrives, so a second one terminates the process.
    /// Otherwise signals are absorbed until the bridge is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(parent: &CancellationToken, release_on_first_signal: bool) -> Self {
        let token = parent.child_token();
        let claim = Claim::acquire();
        let signals = Signals::register();
        let closer = signals.closer();
        let listener = tokio::spawn(listen(
            signals,
            token.clone(),
            Arc::clone(&claim),
            release_on_first_signal,
        ));

        Self {
            token,
            claim,
            closer,
            listener,
        }
    }

    /// The shared cancellation token of this run.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.claim.release();
        self.closer.close();
        self.listener.abort();
    }
}

async fn listen(
    mut signals: Signals,
    token: CancellationToken,
    claim: Arc<Claim>,
    release_on_first_signal: bool,
) {
    let received = signals.recv().await;
    tracing::info!(signal = %received, "Shutdown signal received, stopping services");
    token.cancel();

    if release_on_first_signal {
        claim.release();
        tracing::debug!("Signal bridge released, a further signal terminates the process");
    }
}

/// Process-wide switch letting SIGINT/SIGTERM take their default action.
///
/// Open while no armed bridge still waits for (or absorbs) signals.
struct Passthrough {
    open: Arc<AtomicBool>,
    claims: Mutex<usize>,
}

impl Passthrough {
    fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
            claims: Mutex::new(0),
        }
    }

    fn hold(&self) {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        *claims += 1;
        self.open.store(false, Ordering::SeqCst);
    }

    fn release(&self) {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        *claims = claims.saturating_sub(1);
        if *claims == 0 {
            self.open.store(true, Ordering::SeqCst);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

fn passthrough() -> &'static Passthrough {
    static PASSTHROUGH: OnceLock<Passthrough> = OnceLock::new();
    PASSTHROUGH.get_or_init(|| {
        let passthrough = Passthrough::new();
        install_default_action(&passthrough.open);
        passthrough
    })
}

#[cfg(unix)]
fn install_default_action(open: &Arc<AtomicBool>) {
    use signal_hook::consts::{SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register_conditional_default(signal, Arc::clone(open)) {
            tracing::error!(signal, error = %e, "Failed to install default signal fallback");
        }
    }
}

#[cfg(not(unix))]
fn install_default_action(_open: &Arc<AtomicBool>) {}

/// One bridge's hold on the passthrough switch, given back at most once.
struct Claim {
    released: AtomicBool,
}

impl Claim {
    fn acquire() -> Arc<Self> {
        passthrough().hold();
        Arc::new(Self {
            released: AtomicBool::new(false),
        })
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            passthrough().release();
        }
    }
}

#[cfg(unix)]
struct Signals {
    stream: Option<signal_hook_tokio::Signals>,
}

#[cfg(unix)]
struct Closer(Option<signal_hook_tokio::Handle>);

#[cfg(unix)]
impl Closer {
    fn close(&self) {
        if let Some(handle) = &self.0 {
            handle.close();
        }
    }
}

#[cfg(unix)]
impl Signals {
    fn register() -> Self {
        use signal_hook::consts::{SIGINT, SIGTERM};

        let stream = signal_hook_tokio::Signals::new([SIGINT, SIGTERM])
            .map_err(|e| tracing::error!(error = %e, "Failed to register signal handlers"))
            .ok();

        Self { stream }
    }

    fn closer(&self) -> Closer {
        Closer(self.stream.as_ref().map(|stream| stream.handle()))
    }

    async fn recv(&mut self) -> Received {
        use futures_util::StreamExt;
        use signal_hook::consts::{SIGINT, SIGTERM};

        let Some(stream) = self.stream.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            match stream.next().await {
                Some(SIGINT) => return Received::Interrupt,
                Some(SIGTERM) => return Received::Terminate,
                Some(other) => tracing::debug!(signal = other, "Ignoring unexpected signal"),
                None => return std::future::pending().await,
            }
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
struct Closer;

#[cfg(not(unix))]
impl Closer {
    fn close(&self) {}
}

#[cfg(not(unix))]
impl Signals {
    fn register() -> Self {
        Signals
    }

    fn closer(&self) -> Closer {
        Closer
    }

    async fn recv(&mut self) -> Received {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        Received::Interrupt
    }
}
