//! Error types for the pool control plane.
//!
//! The control plane is total: no method panics, and the only failures that
//! cross the pool boundary are the typed values below. Transient OS errors
//! from attribute application are swallowed inside [`crate::pal`].

use std::io;

/// Why a submission was refused. Refusal has no side effect; callers may
/// retry or drop the task.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The target queue is at `max_tasks`.
    #[error("submission queue is full")]
    QueueFull,

    /// Submissions are locked (a drain was requested via `suspend_all`,
    /// `pause_all`, or `terminate_all`) and `unlock_submissions` has not
    /// been called since.
    #[error("submissions are locked")]
    SubmissionsLocked,

    /// The same object handle is still waiting in a submission queue.
    /// Resubmitting after the previous submission was dispatched is fine.
    #[error("object task is already queued")]
    AlreadyQueued,

    /// The pool is shutting down and no longer accepts work.
    #[error("pool is shutting down")]
    ShuttingDown,
}

/// Why pool creation failed.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// Not a single worker thread could be spawned. Any partially created
    /// workers were torn down before this was returned.
    #[error("could not spawn any worker thread: {0}")]
    NoWorkers(#[source] io::Error),

    /// The dispatcher thread could not be spawned.
    #[error("could not spawn dispatcher thread: {0}")]
    NoDispatcher(#[source] io::Error),
}

/// Result of waiting for an object task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The task finished, or no worker currently holds the handle
    /// (a non-fatal miss — the task may have completed before the wait).
    Completed,
    /// The timeout elapsed while the task was still resident.
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_error_display() {
        assert_eq!(SubmitError::QueueFull.to_string(), "submission queue is full");
        assert_eq!(
            SubmitError::SubmissionsLocked.to_string(),
            "submissions are locked"
        );
    }

    #[test]
    fn spawn_error_preserves_source() {
        use std::error::Error as _;
        let err = SpawnError::NoWorkers(io::Error::other("boom"));
        assert!(err.source().is_some());
    }
}
