//! Ordered group of named units.
//!
//! # Startup
//! ```text
//! member[0] start → ready → member[1] start → ready → ... → group ready
//!        any exit or stop request while starting → abort, shut down
//! ```
//!
//! # Shutdown
//! ```text
//! stop member[n-1] → wait exit → stop member[n-2] → wait exit → ... member[0]
//! ```
//!
//! Every member runs on its own task and reports its exit over a shared
//! channel, so the group notices a failure from any member in any phase.
//! The first failure observed decides the outcome; later ones are kept in
//! the [`GroupError`] for logging.
//!
//! There is no global deadline: a member that never finishes its shutdown
//! keeps the group waiting.

use futures_util::future::BoxFuture;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::error::{GroupError, MemberError, RunError};
use super::process::run_guarded;
use super::runnable::{ready_channel, BoxRunnable, Readiness, Ready, RunResult, Runnable};
use super::shutdown::{stop_channel, StopSignal, Stopper};
use crate::observability::metrics;

/// A unit paired with the name used to report on it.
pub struct Member {
    name: String,
    unit: BoxRunnable,
}

impl Member {
    pub fn new<R: Runnable>(name: impl Into<String>, unit: R) -> Self {
        Self::boxed(name, Box::new(unit))
    }

    pub fn boxed(name: impl Into<String>, unit: BoxRunnable) -> Self {
        Self {
            name: name.into(),
            unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member").field("name", &self.name).finish()
    }
}

/// Lifecycle state of a group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    NotStarted,
    Starting,
    Ready,
    Stopping,
    ExitedOk,
    ExitedError,
}

impl MemberState {
    pub fn as_label(&self) -> &'static str {
        match self {
            MemberState::NotStarted => "not_started",
            MemberState::Starting => "starting",
            MemberState::Ready => "ready",
            MemberState::Stopping => "stopping",
            MemberState::ExitedOk => "exited_ok",
            MemberState::ExitedError => "exited_error",
        }
    }

    pub fn has_exited(&self) -> bool {
        matches!(self, MemberState::ExitedOk | MemberState::ExitedError)
    }
}

/// Units started one after another and stopped in reverse.
///
/// A group is itself a [`Runnable`], so groups nest.
pub struct Group {
    name: String,
    members: Vec<Member>,
    span: tracing::Span,
}

impl Group {
    /// Build a group; `members` order is the startup order.
    pub fn ordered(name: impl Into<String>, members: Vec<Member>) -> Self {
        let name = name.into();
        let span = tracing::info_span!("group", group = %name);
        Self {
            name,
            members,
            span,
        }
    }

    /// Log group events under `span` instead of a fresh `group` span.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(Member::name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Runnable for Group {
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult> {
        let span = self.span.clone();
        Box::pin(run_ordered(*self, ready, stop).instrument(span))
    }
}

/// What ended the run phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    StopRequested,
    MemberExited,
}

type Exit = (usize, RunResult);

struct Started {
    name: String,
    stopper: Stopper,
    state: MemberState,
}

/// Book-keeping for the members that were started.
struct Roster {
    group: String,
    started: Vec<Started>,
    errors: Vec<MemberError>,
}

impl Roster {
    fn transition(&mut self, index: usize, state: MemberState) {
        let member = &mut self.started[index];
        member.state = state;
        metrics::record_member_transition(&self.group, &member.name, state);
    }

    fn ready_count(&self) -> usize {
        self.started
            .iter()
            .filter(|m| m.state == MemberState::Ready)
            .count()
    }

    /// Record an exit report. Exits of members that were not asked to stop
    /// are failures even when they returned `Ok`.
    fn exited(&mut self, index: usize, result: RunResult) {
        let expected = self.started[index].state == MemberState::Stopping;
        let name = self.started[index].name.clone();

        let error = match result {
            Ok(()) if expected => None,
            Ok(()) => Some(RunError::UnexpectedExit),
            Err(err) => Some(err),
        };

        match error {
            None => {
                tracing::info!(member = %name, "member exited");
                self.transition(index, MemberState::ExitedOk);
            }
            Some(error) => {
                tracing::error!(member = %name, error = %error, kind = error.as_label(), "member failed");
                self.transition(index, MemberState::ExitedError);
                self.errors.push(MemberError { name, error });
            }
        }
        metrics::set_members_ready(&self.group, self.ready_count());
    }
}

async fn run_ordered(group: Group, ready: Ready, mut stop: StopSignal) -> RunResult {
    let Group { name, members, .. } = group;
    let total = members.len();
    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<Exit>();
    let mut roster = Roster {
        group: name.clone(),
        started: Vec::with_capacity(total),
        errors: Vec::new(),
    };

    tracing::info!(members = total, "starting group");

    let mut trigger = None;
    for (index, member) in members.into_iter().enumerate() {
        let Member { name: member_name, unit } = member;
        let (stopper, member_stop) = stop_channel();
        let (member_ready, mut listener) = ready_channel();

        tracing::info!(member = %member_name, "starting member");
        roster.started.push(Started {
            name: member_name.clone(),
            stopper,
            state: MemberState::NotStarted,
        });
        roster.transition(index, MemberState::Starting);

        let tx = exit_tx.clone();
        let span = tracing::info_span!("member", member = %member_name);
        tokio::spawn(
            async move {
                let result = run_guarded(unit, member_ready, member_stop).await;
                let _ = tx.send((index, result));
            }
            .instrument(span),
        );

        let mut awaiting_ready = true;
        let outcome = loop {
            tokio::select! {
                readiness = listener.wait_mut(), if awaiting_ready => {
                    awaiting_ready = false;
                    if let Readiness::Ready(addr) = readiness {
                        log_ready(&member_name, addr);
                        roster.transition(index, MemberState::Ready);
                        metrics::set_members_ready(&name, roster.ready_count());
                        break None;
                    }
                    // Notifier dropped: the exit report follows.
                }
                Some((exited, result)) = exit_rx.recv() => {
                    roster.exited(exited, result);
                    break Some(Trigger::MemberExited);
                }
                _ = stop.recv() => {
                    tracing::info!(member = %member_name, "stop requested during startup");
                    break Some(Trigger::StopRequested);
                }
            }
        };

        if outcome.is_some() {
            trigger = outcome;
            break;
        }
    }

    let trigger = match trigger {
        Some(trigger) => {
            tracing::warn!(
                started = roster.started.len(),
                members = total,
                "group startup aborted"
            );
            trigger
        }
        None => {
            tracing::info!(members = total, "group ready");
            ready.notify();

            tokio::select! {
                _ = stop.recv() => Trigger::StopRequested,
                Some((exited, result)) = exit_rx.recv() => {
                    roster.exited(exited, result);
                    Trigger::MemberExited
                }
            }
        }
    };

    tracing::info!(trigger = ?trigger, "stopping group");

    for index in (0..roster.started.len()).rev() {
        if roster.started[index].state.has_exited() {
            continue;
        }

        tracing::info!(member = %roster.started[index].name, "stopping member");
        roster.transition(index, MemberState::Stopping);
        roster.started[index].stopper.stop();

        while !roster.started[index].state.has_exited() {
            match exit_rx.recv().await {
                Some((exited, result)) => roster.exited(exited, result),
                None => break,
            }
        }
    }

    drop(exit_tx);

    match GroupError::new(name, roster.errors) {
        Some(err) => {
            tracing::error!(error = %err, "group stopped with errors");
            for member in err.errors() {
                tracing::error!(member = %member.name, error = %member.error, "member error");
            }
            Err(RunError::Group(err))
        }
        None => {
            tracing::info!("group stopped");
            Ok(())
        }
    }
}

fn log_ready(member: &str, addr: Option<SocketAddr>) {
    match addr {
        Some(addr) => tracing::info!(member = %member, address = %addr, "member ready"),
        None => tracing::info!(member = %member, "member ready"),
    }
}
