/*
[INPUT]:  TaskDetail snapshots (poll completions), fetch errors, inspector selection
[OUTPUT]: TaskView model with monotonic progress and a re-resolved inspector
[POS]:    Tracking layer - merges engine snapshots into the displayed task
[UPDATE]: When snapshot ordering rules or view-only state change
*/

use chrono::{DateTime, Utc};
use secprobe_adapter::{ResultId, Task, TaskDetail, TaskId, TaskResult};
use tracing::debug;

use crate::error::ConsoleError;
use crate::gate::{ActionSet, actions_for};

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Snapshot replaced the view. `inspector_closed` is set when the
    /// inspected result disappeared from the new result list.
    Applied { inspector_closed: bool },
    /// Snapshot carried lower progress than what is displayed.
    DroppedStale { displayed: f64, received: f64 },
    /// Snapshot belongs to another task.
    DroppedForeign { received: TaskId },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Non-blocking indicator for failed fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchIssue {
    pub message: String,
    pub consecutive_failures: u32,
}

/// Displayed state of one task.
#[derive(Debug, Clone)]
pub struct TaskView {
    task_id: TaskId,
    detail: Option<TaskDetail>,
    inspected: Option<ResultId>,
    fetch_issue: Option<FetchIssue>,
    retry_requested: bool,
    last_applied_at: Option<DateTime<Utc>>,
}

impl TaskView {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            detail: None,
            inspected: None,
            fetch_issue: None,
            retry_requested: false,
            last_applied_at: None,
        }
    }

    /// Merge a snapshot. The server is authoritative: an applied snapshot
    /// replaces counters, status and the result list wholesale.
    pub fn apply_snapshot(&mut self, snapshot: TaskDetail) -> ApplyOutcome {
        if snapshot.task.id != self.task_id {
            return ApplyOutcome::DroppedForeign {
                received: snapshot.task.id,
            };
        }
        self.fetch_issue = None;

        if let Some(current) = &self.detail {
            let displayed = current.task.progress;
            let received = snapshot.task.progress;
            let resumed = current.task.status.is_terminal() && snapshot.task.status.is_active();
            if received < displayed && !resumed && !self.retry_requested {
                debug!(
                    task_id = self.task_id,
                    displayed, received, "dropping stale snapshot"
                );
                return ApplyOutcome::DroppedStale { displayed, received };
            }
        }

        // The allowance covers one snapshot; later regressions are stale again.
        self.retry_requested = false;

        let inspector_closed = match self.inspected {
            Some(result_id) if snapshot.result(result_id).is_none() => {
                self.inspected = None;
                true
            }
            _ => false,
        };

        self.detail = Some(snapshot);
        self.last_applied_at = Some(Utc::now());
        ApplyOutcome::Applied { inspector_closed }
    }

    /// Record a failed fetch without touching the displayed snapshot.
    pub fn record_fetch_error(&mut self, err: &ConsoleError) {
        let consecutive_failures = self
            .fetch_issue
            .as_ref()
            .map_or(1, |issue| issue.consecutive_failures + 1);
        self.fetch_issue = Some(FetchIssue {
            message: err.to_string(),
            consecutive_failures,
        });
    }

    /// The engine accepted a retry: the next applied snapshot may legitimately
    /// show lower progress under the same task id.
    pub fn mark_retry_requested(&mut self) {
        self.retry_requested = true;
    }

    pub fn retry_requested(&self) -> bool {
        self.retry_requested
    }

    /// Open the inspector on a result. Returns `false` for unknown ids.
    pub fn inspect(&mut self, result_id: ResultId) -> bool {
        let known = self
            .detail
            .as_ref()
            .is_some_and(|detail| detail.result(result_id).is_some());
        if known {
            self.inspected = Some(result_id);
        }
        known
    }

    pub fn close_inspector(&mut self) {
        self.inspected = None;
    }

    pub fn inspected_result(&self) -> Option<&TaskResult> {
        let result_id = self.inspected?;
        self.detail.as_ref()?.result(result_id)
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn task(&self) -> Option<&Task> {
        self.detail.as_ref().map(|detail| &detail.task)
    }

    pub fn detail(&self) -> Option<&TaskDetail> {
        self.detail.as_ref()
    }

    pub fn results(&self) -> &[TaskResult] {
        self.detail
            .as_ref()
            .map(|detail| detail.results.as_slice())
            .unwrap_or_default()
    }

    pub fn fetch_issue(&self) -> Option<&FetchIssue> {
        self.fetch_issue.as_ref()
    }

    pub fn last_applied_at(&self) -> Option<DateTime<Utc>> {
        self.last_applied_at
    }

    /// Actions permitted by the displayed snapshot; empty before the first one.
    pub fn actions(&self) -> ActionSet {
        self.task().map(actions_for).unwrap_or_default()
    }
}
