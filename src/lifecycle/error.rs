//! Error types produced by runnable units and the supervisor.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Terminal failure of a [`Runnable`](crate::lifecycle::Runnable) unit.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunError {
    /// The unit could not bind its listener.
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed after it was bound.
    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),

    /// OS signal handlers could not be registered.
    #[error("register signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    /// A long-running unit returned on its own without being asked to stop.
    #[error("exited unexpectedly")]
    UnexpectedExit,

    /// The unit panicked while running.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The wrapped unit did not finish within the shutdown deadline.
    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimedOut(Duration),

    /// One or more members of a group failed.
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Unit specific failure.
    #[error("{0}")]
    Other(String),
}

impl RunError {
    /// Short stable label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Bind { .. } => "bind",
            RunError::Serve(_) => "serve",
            RunError::Signal(_) => "signal",
            RunError::UnexpectedExit => "unexpected_exit",
            RunError::Panicked(_) => "panicked",
            RunError::ShutdownTimedOut(_) => "shutdown_timed_out",
            RunError::Group(_) => "group",
            RunError::Other(_) => "other",
        }
    }
}

/// A failure attributed to a named group member.
#[derive(Debug, Error)]
#[error("{name}: {error}")]
pub struct MemberError {
    pub name: String,
    #[source]
    pub error: RunError,
}

/// Aggregated failure report of an ordered group.
///
/// The first entry is the cause reported for the group; the remaining
/// entries were observed later (usually while shutting down) and are kept
/// for logging only.
#[derive(Debug)]
pub struct GroupError {
    group: String,
    errors: Vec<MemberError>,
}

impl GroupError {
    pub(crate) fn new(group: impl Into<String>, errors: Vec<MemberError>) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        Some(Self {
            group: group.into(),
            errors,
        })
    }

    /// Name of the group that failed.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The failure that decided the group's outcome.
    pub fn cause(&self) -> &MemberError {
        &self.errors[0]
    }

    /// Every member failure in the order it was observed.
    pub fn errors(&self) -> &[MemberError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<MemberError> {
        self.errors
    }
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} member {}", self.group, self.cause())?;
        let rest = self.errors.len() - 1;
        if rest > 0 {
            write!(f, " (and {rest} more)")?;
        }
        Ok(())
    }
}

impl std::error::Error for GroupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_group_error_is_none() {
        assert!(GroupError::new("g", Vec::new()).is_none());
    }

    #[test]
    fn display_names_first_member_and_count() {
        let err = GroupError::new(
            "controller",
            vec![
                MemberError {
                    name: "http_server".into(),
                    error: RunError::UnexpectedExit,
                },
                MemberError {
                    name: "debug-server".into(),
                    error: RunError::Other("boom".into()),
                },
            ],
        )
        .unwrap();

        assert_eq!(err.cause().name, "http_server");
        assert_eq!(
            err.to_string(),
            "controller member http_server: exited unexpectedly (and 1 more)"
        );
    }
}
