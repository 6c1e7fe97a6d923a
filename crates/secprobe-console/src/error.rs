/*
[INPUT]:  Local validation failures and EngineError values from the adapter
[OUTPUT]: ConsoleError taxonomy with per-call-site translation rules
[POS]:    Error handling layer - every engine failure is translated here
[UPDATE]: When adding intents or changing how engine statuses map to the taxonomy
*/

use secprobe_adapter::{EngineError, TaskId};
use thiserror::Error;

/// Errors surfaced by the console core.
///
/// Nothing here is fatal: every variant maps to a recoverable display state.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Target address is not an IPv4 dotted quad (caught before any engine call)
    #[error("invalid target address '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Explicit mode with nothing selected (caught before any engine call)
    #[error("no cases selected; select at least one case or run all")]
    EmptySelection,

    /// The composition already produced a task; open a new one to submit again
    #[error("composition already submitted as task {task_id}")]
    SessionClosed { task_id: TaskId },

    /// Engine re-validated the creation request and rejected it
    #[error("engine rejected the task request: {0}")]
    Validation(String),

    /// Engine refused task creation (capacity, concurrency limits)
    #[error("engine cannot accept the task right now: {0}")]
    Conflict(String),

    /// Action rejected because the task moved to another status
    #[error("task {task_id} is no longer in a state that allows this: {message}")]
    InvalidState { task_id: TaskId, message: String },

    /// A poll or refresh failed; the loop keeps going
    #[error("failed to fetch task {task_id}: {message}")]
    TransientFetch { task_id: TaskId, message: String },

    /// A second request for an intent that has not settled yet
    #[error("{0} is already in progress")]
    IntentPending(&'static str),

    #[error("not authenticated with the execution engine")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Engine(EngineError),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

impl ConsoleError {
    /// Refusals decided before any engine call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ConsoleError::InvalidTarget { .. }
                | ConsoleError::EmptySelection
                | ConsoleError::SessionClosed { .. }
        )
    }

    /// Whether the caller should re-fetch the task before showing anything else.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, ConsoleError::InvalidState { .. })
    }

    /// Translate a `POST /tasks` failure.
    pub fn from_create(err: EngineError) -> Self {
        match err.status() {
            Some(400 | 422) => ConsoleError::Validation(err.detail()),
            Some(409 | 429 | 503) => ConsoleError::Conflict(err.detail()),
            _ => Self::from_engine(err),
        }
    }

    /// Translate a stop or retry failure.
    pub fn from_action(task_id: TaskId, err: EngineError) -> Self {
        match err.status() {
            Some(400 | 409) => ConsoleError::InvalidState {
                task_id,
                message: err.detail(),
            },
            _ => Self::from_engine(err),
        }
    }

    /// Translate a poll or refresh failure. Every fetch failure is transient.
    pub fn from_fetch(task_id: TaskId, err: EngineError) -> Self {
        ConsoleError::TransientFetch {
            task_id,
            message: err.detail(),
        }
    }

    /// Translation for read-only calls (catalog, task list, reports).
    pub fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::Unauthorized => ConsoleError::Unauthorized,
            EngineError::NotFound { message } => ConsoleError::NotFound(message),
            other => ConsoleError::Engine(other),
        }
    }
}

impl From<EngineError> for ConsoleError {
    fn from(err: EngineError) -> Self {
        Self::from_engine(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> EngineError {
        EngineError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_create_translation() {
        assert!(matches!(
            ConsoleError::from_create(api(422, "target_ip: invalid")),
            ConsoleError::Validation(message) if message == "target_ip: invalid"
        ));
        assert!(matches!(
            ConsoleError::from_create(api(409, "busy")),
            ConsoleError::Conflict(_)
        ));
        assert!(matches!(
            ConsoleError::from_create(api(503, "no workers")),
            ConsoleError::Conflict(_)
        ));
        assert!(matches!(
            ConsoleError::from_create(api(500, "boom")),
            ConsoleError::Engine(_)
        ));
        assert!(matches!(
            ConsoleError::from_create(EngineError::Unauthorized),
            ConsoleError::Unauthorized
        ));
    }

    #[test]
    fn test_action_translation() {
        let err = ConsoleError::from_action(7, api(400, "Cannot stop task with status: completed"));
        assert!(err.needs_refresh());
        assert!(matches!(err, ConsoleError::InvalidState { task_id: 7, .. }));

        let missing = ConsoleError::from_action(
            7,
            EngineError::NotFound {
                message: "Task not found".to_string(),
            },
        );
        assert!(matches!(missing, ConsoleError::NotFound(_)));
    }

    #[test]
    fn test_fetch_failures_are_transient() {
        let err = ConsoleError::from_fetch(3, api(502, "bad gateway"));
        assert!(matches!(err, ConsoleError::TransientFetch { task_id: 3, .. }));
        assert!(!err.is_local());
    }

    #[test]
    fn test_local_errors() {
        assert!(ConsoleError::EmptySelection.is_local());
        assert!(
            ConsoleError::InvalidTarget {
                target: "1.2.3".to_string(),
                reason: "expected four octets".to_string(),
            }
            .is_local()
        );
        assert!(ConsoleError::SessionClosed { task_id: 11 }.is_local());
        assert!(!ConsoleError::Conflict("busy".to_string()).is_local());
    }
}
