/*
[INPUT]:  Task snapshot (status, error_count)
[OUTPUT]: Set of actions an operator may request on that task
[POS]:    Tracking layer - pure action gate
[UPDATE]: When task actions or their preconditions change
*/

use std::fmt;

use secprobe_adapter::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskAction {
    Stop,
    RetryFailed,
}

impl TaskAction {
    pub const ALL: [TaskAction; 2] = [TaskAction::Stop, TaskAction::RetryFailed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskAction::Stop => "stop",
            TaskAction::RetryFailed => "retry-failed",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small fixed set of permitted actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet {
    stop: bool,
    retry_failed: bool,
}

impl ActionSet {
    pub fn contains(&self, action: TaskAction) -> bool {
        match action {
            TaskAction::Stop => self.stop,
            TaskAction::RetryFailed => self.retry_failed,
        }
    }

    pub fn insert(&mut self, action: TaskAction) {
        self.set(action, true);
    }

    pub fn remove(&mut self, action: TaskAction) {
        self.set(action, false);
    }

    pub fn is_empty(&self) -> bool {
        !self.stop && !self.retry_failed
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskAction> + '_ {
        TaskAction::ALL
            .into_iter()
            .filter(move |action| self.contains(*action))
    }

    fn set(&mut self, action: TaskAction, value: bool) {
        match action {
            TaskAction::Stop => self.stop = value,
            TaskAction::RetryFailed => self.retry_failed = value,
        }
    }
}

pub fn actions_for(task: &Task) -> ActionSet {
    actions_for_status(task.status, task.error_count)
}

/// Stop while the task can still make progress; retry only terminal tasks
/// that have errored results.
pub fn actions_for_status(status: TaskStatus, error_count: u32) -> ActionSet {
    ActionSet {
        stop: status.is_active(),
        retry_failed: status.is_terminal() && error_count > 0,
    }
}
