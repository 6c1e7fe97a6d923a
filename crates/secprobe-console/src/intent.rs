/*
[INPUT]:  Begin/settle notifications for side-effecting operator requests
[OUTPUT]: Pending/settled outcome per intent for optimistic feedback
[POS]:    Tracking layer - intent bookkeeping shared by sessions
[UPDATE]: When a new side-effecting intent is exposed to the display layer
*/

use std::collections::HashMap;
use std::fmt;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Submit,
    Stop,
    Retry,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Submit => "submit",
            Intent::Stop => "stop",
            Intent::Retry => "retry",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Accepted(String),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntentState {
    #[default]
    Idle,
    Pending,
    Settled(IntentOutcome),
}

#[derive(Debug, Default)]
pub struct IntentTracker {
    states: HashMap<Intent, IntentState>,
}

impl IntentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an intent pending. Refused while the previous request is unsettled.
    pub fn begin(&mut self, intent: Intent) -> Result<()> {
        if self.is_pending(intent) {
            return Err(ConsoleError::IntentPending(intent.as_str()));
        }
        self.states.insert(intent, IntentState::Pending);
        Ok(())
    }

    pub fn settle(&mut self, intent: Intent, outcome: IntentOutcome) {
        self.states.insert(intent, IntentState::Settled(outcome));
    }

    /// Settle from the result of the engine call.
    pub fn settle_with<T>(&mut self, intent: Intent, result: &Result<T>, accepted: impl FnOnce(&T) -> String) {
        let outcome = match result {
            Ok(value) => IntentOutcome::Accepted(accepted(value)),
            Err(err) => IntentOutcome::Rejected(err.to_string()),
        };
        self.settle(intent, outcome);
    }

    pub fn is_pending(&self, intent: Intent) -> bool {
        matches!(self.states.get(&intent), Some(IntentState::Pending))
    }

    pub fn state(&self, intent: Intent) -> IntentState {
        self.states.get(&intent).cloned().unwrap_or_default()
    }
}
