//! Stop coordination between a unit and whoever supervises it.

use tokio::sync::watch;

/// Sending half of a stop request.
///
/// Held by the supervisor of a unit. Dropping it counts as a stop request.
#[derive(Debug)]
pub struct Stopper {
    tx: watch::Sender<bool>,
}

/// Receiving half of a stop request, handed to [`Runnable::run`](super::Runnable::run).
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected stop pair.
pub fn stop_channel() -> (Stopper, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (Stopper { tx }, StopSignal { rx })
}

impl Stopper {
    /// Request a stop.
    ///
    /// Returns `true` only for the call that actually flipped the state;
    /// repeated calls are no-ops and waiters are not woken again.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    /// Whether a stop has already been requested.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new receiver observing this stopper.
    pub fn subscribe(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl StopSignal {
    /// Wait until a stop is requested or the [`Stopper`] is gone.
    ///
    /// Resolves immediately on every call once stopped.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }

    /// Whether a stop has already been requested.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (stopper, mut signal) = stop_channel();
        assert!(!signal.is_stopped());

        assert!(stopper.stop());
        assert!(!stopper.stop());
        assert!(stopper.is_stopped());

        signal.recv().await;
        // Already stopped: resolves again without blocking.
        tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .expect("second recv should resolve");
    }

    #[tokio::test]
    async fn dropping_stopper_releases_waiters() {
        let (stopper, mut signal) = stop_channel();
        let waiter = tokio::spawn(async move {
            signal.recv().await;
        });

        drop(stopper);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn subscribers_see_the_same_stop() {
        let (stopper, first) = stop_channel();
        let second = stopper.subscribe();
        stopper.stop();
        assert!(first.is_stopped());
        assert!(second.is_stopped());
    }
}
