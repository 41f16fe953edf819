//! The contract every supervised unit implements.
//!
//! A unit is started once, announces readiness at most once through
//! [`Ready`], and keeps running until it either fails or observes its
//! [`StopSignal`]. Servers, groups of servers and the signal monitor all
//! implement the same trait, so they compose freely.

use futures_util::future::BoxFuture;
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::oneshot;

use super::error::RunError;
use super::shutdown::StopSignal;

/// Outcome of a single `run`.
pub type RunResult = Result<(), RunError>;

/// Something the supervisor can start, ready-gate and stop.
///
/// `run` must not return before it has either failed or received and fully
/// processed a stop request. It must call [`Ready::notify`] as soon as it can
/// do useful work, and must not call it at all if it fails to get there.
pub trait Runnable: Send + 'static {
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult>;
}

/// Boxed unit, as stored by groups and monitors.
pub type BoxRunnable = Box<dyn Runnable>;

/// One-shot readiness notifier.
///
/// Consumed by [`notify`](Ready::notify); dropping it without notifying tells
/// the listener the unit never became ready.
#[derive(Debug)]
pub struct Ready {
    tx: oneshot::Sender<Option<SocketAddr>>,
}

/// Waiting side of [`Ready`].
#[derive(Debug)]
pub struct ReadyListener {
    rx: oneshot::Receiver<Option<SocketAddr>>,
}

/// Create a connected readiness pair.
pub fn ready_channel() -> (Ready, ReadyListener) {
    let (tx, rx) = oneshot::channel();
    (Ready { tx }, ReadyListener { rx })
}

impl Ready {
    /// Announce readiness.
    pub fn notify(self) {
        let _ = self.tx.send(None);
    }

    /// Announce readiness along with the address the unit is serving on.
    pub fn notify_listening(self, addr: SocketAddr) {
        let _ = self.tx.send(Some(addr));
    }
}

/// Readiness as observed by a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The unit announced readiness, optionally with its bound address.
    Ready(Option<SocketAddr>),
    /// The notifier was dropped before readiness was announced.
    NeverReady,
}

impl ReadyListener {
    pub async fn wait(self) -> Readiness {
        match self.rx.await {
            Ok(addr) => Readiness::Ready(addr),
            Err(_) => Readiness::NeverReady,
        }
    }

    /// Borrowing variant for use inside `select!` loops.
    pub(crate) async fn wait_mut(&mut self) -> Readiness {
        match (&mut self.rx).await {
            Ok(addr) => Readiness::Ready(addr),
            Err(_) => Readiness::NeverReady,
        }
    }
}

/// Unit built from a closure.
pub struct RunFn<F> {
    f: F,
}

/// Adapt a closure into a [`Runnable`].
///
/// ```
/// use silk_controller::lifecycle::{run_fn, Ready, StopSignal};
///
/// let unit = run_fn(|ready: Ready, mut stop: StopSignal| async move {
///     ready.notify();
///     stop.recv().await;
///     Ok(())
/// });
/// # let _ = unit;
/// ```
pub fn run_fn<F, Fut>(f: F) -> RunFn<F>
where
    F: FnOnce(Ready, StopSignal) -> Fut + Send + 'static,
    Fut: Future<Output = RunResult> + Send + 'static,
{
    RunFn { f }
}

impl<F, Fut> Runnable for RunFn<F>
where
    F: FnOnce(Ready, StopSignal) -> Fut + Send + 'static,
    Fut: Future<Output = RunResult> + Send + 'static,
{
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult> {
        Box::pin((self.f)(ready, stop))
    }
}
