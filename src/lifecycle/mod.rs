//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + TLS context → service adapters → ordered group
//!
//! Supervision (group.rs, signals.rs):
//!     SignalMonitor ─ wraps ─▶ Group ─ starts in order ─▶ members
//!     SIGINT/SIGTERM → one stop request → reverse-order shutdown
//!
//! Contract (runnable.rs, shutdown.rs):
//!     run(ready, stop) → Ok on requested stop, Err on fatal failure
//! ```
//!
//! # Design Decisions
//! - Ordered startup: member N+1 starts only after member N is ready
//! - Ordered shutdown: reverse order, each member awaited before the next
//! - Fail fast: the first failure wins and is reported with the member name
//! - No retries at this layer; units own their retry policy

pub mod error;
pub mod group;
pub mod process;
pub mod runnable;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use error::{GroupError, MemberError, RunError};
pub use group::{Group, Member, MemberState};
pub use process::{invoke, Process};
pub use runnable::{ready_channel, run_fn, BoxRunnable, Readiness, Ready, ReadyListener, RunFn, RunResult, Runnable};
pub use shutdown::{stop_channel, StopSignal, Stopper};
pub use signals::{Signal, SignalMonitor};
