//! Running a unit on its own task.

use futures_util::FutureExt;
use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use tokio::task::{JoinError, JoinHandle};

use super::error::RunError;
use super::runnable::{ready_channel, BoxRunnable, Readiness, Ready, ReadyListener, RunResult, Runnable};
use super::shutdown::{stop_channel, StopSignal, Stopper};

/// Drive `unit` to completion, turning a panic into [`RunError::Panicked`].
pub(crate) async fn run_guarded(unit: BoxRunnable, ready: Ready, stop: StopSignal) -> RunResult {
    let outcome = AssertUnwindSafe(async move { unit.run(ready, stop).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(RunError::Panicked(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn join_outcome(joined: Result<RunResult, JoinError>) -> RunResult {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(RunError::Panicked(panic_message(err.into_panic().as_ref()))),
        Err(_) => Err(RunError::Other("task cancelled".into())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Handle to a unit running on its own task.
pub struct Process {
    stopper: Stopper,
    ready: Option<ReadyListener>,
    readiness: Option<Readiness>,
    join: JoinHandle<RunResult>,
    finished: Option<RunResult>,
}

impl Process {
    /// Start `unit` on a new task.
    pub fn spawn<R: Runnable>(unit: R) -> Self {
        Self::spawn_boxed(Box::new(unit))
    }

    pub fn spawn_boxed(unit: BoxRunnable) -> Self {
        let (ready, listener) = ready_channel();
        let (stopper, stop) = stop_channel();
        let join = tokio::spawn(run_guarded(unit, ready, stop));

        Self {
            stopper,
            ready: Some(listener),
            readiness: None,
            join,
            finished: None,
        }
    }

    /// Wait until the unit announces readiness or gives up on it.
    pub async fn ready(&mut self) -> Readiness {
        if let Some(listener) = self.ready.take() {
            self.readiness = Some(listener.wait().await);
        }
        self.readiness.unwrap_or(Readiness::NeverReady)
    }

    /// Address the unit reported when it became ready, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.readiness {
            Some(Readiness::Ready(addr)) => addr,
            _ => None,
        }
    }

    /// Whether [`Process::ready`] has seen the unit announce readiness.
    pub fn became_ready(&self) -> bool {
        matches!(self.readiness, Some(Readiness::Ready(_)))
    }

    /// Ask the unit to stop. Returns `false` if a stop was already requested.
    pub fn stop(&self) -> bool {
        self.stopper.stop()
    }

    /// Wait for the unit to finish and return its outcome.
    pub async fn wait(self) -> RunResult {
        let Process {
            stopper,
            join,
            finished,
            ..
        } = self;
        let outcome = match finished {
            Some(outcome) => outcome,
            None => join_outcome(join.await),
        };
        drop(stopper);
        outcome
    }

    /// Whether the unit has already returned.
    pub fn is_finished(&self) -> bool {
        self.finished.is_some() || self.join.is_finished()
    }
}

/// Start `unit` and wait until it is ready or has returned.
///
/// A unit that fails before becoming ready has its error returned here. One
/// that returns `Ok` first (a stop arrived during startup) still yields a
/// [`Process`], whose [`Process::wait`] reports that clean outcome.
pub async fn invoke<R: Runnable>(unit: R) -> Result<Process, RunError> {
    let mut process = Process::spawn(unit);
    if let Readiness::Ready(_) = process.ready().await {
        return Ok(process);
    }

    join_outcome((&mut process.join).await)?;
    process.finished = Some(Ok(()));
    Ok(process)
}
