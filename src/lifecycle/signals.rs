//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT/SIGTERM handlers (ctrl-c off Unix)
//! - Translate the first signal into a stop request for the wrapped unit
//! - Forward the wrapped unit's outcome as the monitor's own
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe); nothing runs in a signal handler
//! - Repeated signals during shutdown are logged and ignored, never forced
//! - An optional deadline bounds how long shutdown may take once requested

use futures_util::future::BoxFuture;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tracing::Instrument;

use super::error::RunError;
use super::process::{join_outcome, run_guarded};
use super::runnable::{ready_channel, BoxRunnable, Readiness, Ready, RunResult, Runnable};
use super::shutdown::{stop_channel, StopSignal, Stopper};

/// Termination signals the monitor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

enum Source {
    Os,
    Channel(mpsc::UnboundedReceiver<Signal>),
}

enum Signals {
    #[cfg(unix)]
    Os {
        interrupt: tokio::signal::unix::Signal,
        terminate: tokio::signal::unix::Signal,
    },
    #[cfg(not(unix))]
    Os,
    Channel(mpsc::UnboundedReceiver<Signal>),
}

impl Signals {
    fn register(source: Source) -> std::io::Result<Self> {
        match source {
            #[cfg(unix)]
            Source::Os => {
                use tokio::signal::unix::{signal, SignalKind};
                Ok(Signals::Os {
                    interrupt: signal(SignalKind::interrupt())?,
                    terminate: signal(SignalKind::terminate())?,
                })
            }
            #[cfg(not(unix))]
            Source::Os => Ok(Signals::Os),
            Source::Channel(rx) => Ok(Signals::Channel(rx)),
        }
    }

    /// Next signal, or `None` once the source can deliver no more.
    async fn recv(&mut self) -> Option<Signal> {
        match self {
            #[cfg(unix)]
            Signals::Os {
                interrupt,
                terminate,
            } => tokio::select! {
                s = interrupt.recv() => s.map(|_| Signal::Interrupt),
                s = terminate.recv() => s.map(|_| Signal::Terminate),
            },
            #[cfg(not(unix))]
            Signals::Os => tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt),
            Signals::Channel(rx) => rx.recv().await,
        }
    }
}

/// Wraps a unit so termination signals become a single stop request.
pub struct SignalMonitor {
    unit: BoxRunnable,
    source: Source,
    deadline: Option<Duration>,
    span: tracing::Span,
}

impl SignalMonitor {
    /// Monitor the process's SIGINT and SIGTERM.
    pub fn new<R: Runnable>(unit: R) -> Self {
        Self::build(Box::new(unit), Source::Os)
    }

    /// Monitor signals delivered through `signals` instead of the OS.
    pub fn with_signals<R: Runnable>(unit: R, signals: mpsc::UnboundedReceiver<Signal>) -> Self {
        Self::build(Box::new(unit), Source::Channel(signals))
    }

    fn build(unit: BoxRunnable, source: Source) -> Self {
        Self {
            unit,
            source,
            deadline: None,
            span: tracing::info_span!("sigmon"),
        }
    }

    /// Give up waiting for the wrapped unit `deadline` after a stop was forwarded.
    pub fn shutdown_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }
}

impl Runnable for SignalMonitor {
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult> {
        let span = self.span.clone();
        Box::pin(monitor(*self, ready, stop).instrument(span))
    }
}

/// Why the wrapped unit is being stopped.
enum StopCause {
    Signal(Signal),
    Caller,
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCause::Signal(signal) => write!(f, "{signal}"),
            StopCause::Caller => f.write_str("stop request"),
        }
    }
}

async fn monitor(monitor: SignalMonitor, ready: Ready, mut stop: StopSignal) -> RunResult {
    let SignalMonitor {
        unit,
        source,
        deadline,
        ..
    } = monitor;

    let mut signals = Signals::register(source).map_err(RunError::Signal)?;

    let (unit_ready, mut listener) = ready_channel();
    let (stopper, unit_stop) = stop_channel();
    let mut task = tokio::spawn(run_guarded(unit, unit_ready, unit_stop));

    let mut ready = Some(ready);
    let mut awaiting_ready = true;
    let mut signals_open = true;
    let mut caller_stop_seen = false;
    let mut expiry: Option<Pin<Box<Sleep>>> = None;

    loop {
        let cause = tokio::select! {
            joined = &mut task => {
                let outcome = join_outcome(joined);
                match &outcome {
                    Ok(()) => tracing::info!("monitored unit exited"),
                    Err(err) => tracing::error!(error = %err, "monitored unit failed"),
                }
                return outcome;
            }
            readiness = listener.wait_mut(), if awaiting_ready => {
                awaiting_ready = false;
                if let (Readiness::Ready(_), Some(ready)) = (readiness, ready.take()) {
                    tracing::info!("ready, waiting for signals");
                    ready.notify();
                }
                continue;
            }
            signal = signals.recv(), if signals_open => match signal {
                Some(signal) => StopCause::Signal(signal),
                None => {
                    signals_open = false;
                    continue;
                }
            },
            _ = stop.recv(), if !caller_stop_seen => {
                caller_stop_seen = true;
                StopCause::Caller
            }
            _ = expired(&mut expiry) => {
                let limit = deadline.unwrap_or_default();
                tracing::error!(deadline = ?limit, "shutdown deadline exceeded");
                task.abort();
                return Err(RunError::ShutdownTimedOut(limit));
            }
        };

        forward(&stopper, &cause, deadline, &mut expiry);
    }
}

fn forward(
    stopper: &Stopper,
    cause: &StopCause,
    deadline: Option<Duration>,
    expiry: &mut Option<Pin<Box<Sleep>>>,
) {
    if stopper.stop() {
        tracing::info!(cause = %cause, "stopping monitored unit");
        if let Some(limit) = deadline {
            *expiry = Some(Box::pin(tokio::time::sleep(limit)));
        }
    } else {
        tracing::info!(cause = %cause, "shutdown already in progress, ignoring");
    }
}

async fn expired(expiry: &mut Option<Pin<Box<Sleep>>>) {
    match expiry {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
