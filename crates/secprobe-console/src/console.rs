/*
[INPUT]:  ExecutionEngine, PollCadence, shutdown CancellationToken, operator intents
[OUTPUT]: CompositionSession (catalog + selection + submit) and TaskDetailSession
          (view + gate + intents + poller)
[POS]:    Orchestration layer - translates engine errors at every call site
[UPDATE]: When adding intents or changing post-action refresh rules
*/

use std::sync::Arc;

use secprobe_adapter::{
    ActionAck, ExecutionEngine, Page, ReportFormat, ResultId, Task, TaskId, TaskQuery,
};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::CaseCatalog;
use crate::error::{ConsoleError, Result};
use crate::gate::{ActionSet, TaskAction};
use crate::intent::{Intent, IntentState, IntentTracker};
use crate::poller::{
    BoardPoller, BoardUpdate, PollCadence, PollEvent, PollState, PollUpdate, StartOutcome,
    StopReason, TaskPoller,
};
use crate::reconcile::{ApplyOutcome, TaskView};
use crate::request::{ComposeError, TaskRequest, build_request};
use crate::selection::SelectionTree;
use crate::summary::DashboardSummary;

/// Entry point of the console core.
#[derive(Debug)]
pub struct TaskConsole<E: ?Sized> {
    engine: Arc<E>,
    cadence: PollCadence,
    shutdown: CancellationToken,
}

impl<E> TaskConsole<E>
where
    E: ExecutionEngine + ?Sized + 'static,
{
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            cadence: PollCadence::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cadence(mut self, cadence: PollCadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Every poller created by this console stops when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn cadence(&self) -> PollCadence {
        self.cadence
    }

    /// Load the catalog and open a fresh composition.
    pub async fn compose(&self) -> Result<CompositionSession> {
        let catalog = CaseCatalog::fetch(self.engine.as_ref()).await?;
        Ok(CompositionSession::new(Arc::new(catalog)))
    }

    /// Validate locally, then create the task.
    ///
    /// Local validation failures never reach the engine. The session is left
    /// untouched on every failure so the operator can retry as-is; a
    /// successful submit closes it and discards the selection.
    pub async fn submit(&self, session: &mut CompositionSession, target: &str) -> Result<Task> {
        if let Some(task_id) = session.last_submitted {
            return Err(ConsoleError::SessionClosed { task_id });
        }
        let request = session.build(target).map_err(ConsoleError::from)?;
        session.intents.begin(Intent::Submit)?;

        let result = self
            .engine
            .create_task(&request.to_create_request())
            .await
            .map_err(ConsoleError::from_create);
        session
            .intents
            .settle_with(Intent::Submit, &result, |task| format!("task {} created", task.id));

        match &result {
            Ok(task) => {
                session.last_submitted = Some(task.id);
                session.selection.clear_all();
                session.description = None;
                info!(
                    session = %session.id,
                    task_id = task.id,
                    target = %request.target(),
                    run_all = request.is_run_all(),
                    "task submitted"
                );
            }
            Err(err) => warn!(session = %session.id, error = %err, "task submission rejected"),
        }
        result
    }

    /// Open a detail session. Polling starts only when asked.
    pub fn open_task(&self, task_id: TaskId) -> TaskDetailSession<E> {
        let shutdown = self.shutdown.child_token();
        let (poller, events) =
            TaskPoller::with_shutdown(self.engine.clone(), self.cadence.detail, shutdown.clone());
        TaskDetailSession {
            engine: self.engine.clone(),
            view: TaskView::new(task_id),
            poller,
            events,
            intents: IntentTracker::new(),
            shutdown,
        }
    }

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>> {
        Ok(self.engine.list_tasks(query).await?)
    }

    /// Refresh a page of the task list at the list cadence.
    pub fn watch_board(&self, query: TaskQuery) -> (BoardPoller, mpsc::UnboundedReceiver<BoardUpdate>) {
        BoardPoller::spawn(self.engine.clone(), query, self.cadence.list, &self.shutdown)
    }

    /// Catalog totals and recent task activity.
    pub async fn summary(&self) -> Result<DashboardSummary> {
        DashboardSummary::fetch(self.engine.as_ref()).await
    }

    pub async fn export_report(&self, task_id: TaskId, format: ReportFormat) -> Result<Vec<u8>> {
        Ok(self.engine.export_report(task_id, format).await?)
    }
}

/// One composition: catalog snapshot, selection tree and submit intent.
#[derive(Debug)]
pub struct CompositionSession {
    id: Uuid,
    selection: SelectionTree,
    description: Option<String>,
    intents: IntentTracker,
    last_submitted: Option<TaskId>,
}

impl CompositionSession {
    pub fn new(catalog: Arc<CaseCatalog>) -> Self {
        Self {
            id: Uuid::new_v4(),
            selection: SelectionTree::new(catalog),
            description: None,
            intents: IntentTracker::new(),
            last_submitted: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &CaseCatalog {
        self.selection.catalog()
    }

    pub fn selection(&self) -> &SelectionTree {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTree {
        &mut self.selection
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn submit_state(&self) -> IntentState {
        self.intents.state(Intent::Submit)
    }

    pub fn last_submitted(&self) -> Option<TaskId> {
        self.last_submitted
    }

    /// A session closes once it has created a task.
    pub fn is_closed(&self) -> bool {
        self.last_submitted.is_some()
    }

    /// Build the request the next submit would send.
    pub fn build(&self, target: &str) -> std::result::Result<TaskRequest, ComposeError> {
        build_request(target, &self.selection, self.description.as_deref())
    }
}

/// What a detail session reports after consuming a poll event.
#[derive(Debug)]
pub enum SessionUpdate {
    Snapshot(ApplyOutcome),
    FetchFailed(ConsoleError),
}

/// Detail view of one task.
pub struct TaskDetailSession<E: ?Sized> {
    engine: Arc<E>,
    view: TaskView,
    poller: TaskPoller<E>,
    events: mpsc::UnboundedReceiver<PollEvent>,
    intents: IntentTracker,
    shutdown: CancellationToken,
}

impl<E> TaskDetailSession<E>
where
    E: ExecutionEngine + ?Sized + 'static,
{
    pub fn task_id(&self) -> TaskId {
        self.view.task_id()
    }

    pub fn view(&self) -> &TaskView {
        &self.view
    }

    pub fn inspect(&mut self, result_id: ResultId) -> bool {
        self.view.inspect(result_id)
    }

    pub fn close_inspector(&mut self) {
        self.view.close_inspector();
    }

    pub fn start_polling(&self) -> StartOutcome {
        self.poller.start(self.task_id())
    }

    pub fn stop_polling(&self) -> bool {
        self.poller.cancel(self.task_id())
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling(self.task_id())
    }

    pub fn poll_state(&self) -> PollState {
        self.poller.state(self.task_id())
    }

    pub fn intents(&self) -> &IntentTracker {
        &self.intents
    }

    /// Actions the display may offer: the gate on the displayed snapshot,
    /// minus intents that have not settled yet.
    pub fn available_actions(&self) -> ActionSet {
        let mut actions = self.view.actions();
        if self.intents.is_pending(Intent::Stop) {
            actions.remove(TaskAction::Stop);
        }
        if self.intents.is_pending(Intent::Retry) {
            actions.remove(TaskAction::RetryFailed);
        }
        actions
    }

    /// Apply one poll event. Events of a cancelled or superseded poll are
    /// dropped and yield `None`.
    pub fn apply_event(&mut self, event: PollEvent) -> Option<SessionUpdate> {
        if event.task_id != self.task_id() || !self.poller.accepts(&event) {
            debug!(
                task_id = event.task_id,
                generation = event.generation,
                "ignoring event of an inactive poll"
            );
            return None;
        }
        match event.update {
            PollUpdate::Snapshot(detail) => {
                Some(SessionUpdate::Snapshot(self.view.apply_snapshot(detail)))
            }
            PollUpdate::Failed(err) => {
                self.view.record_fetch_error(&err);
                Some(SessionUpdate::FetchFailed(err))
            }
        }
    }

    /// Wait for the next applicable poll event.
    ///
    /// Returns `None` once polling has stopped and every queued event has been
    /// consumed, or when the console is shutting down.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) => {
                    if !self.is_polling() {
                        return None;
                    }
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return None,
                        event = self.events.recv() => event?,
                    }
                }
            };
            if let Some(update) = self.apply_event(event) {
                return Some(update);
            }
        }
    }

    /// One-off fetch applied to the view.
    pub async fn refresh(&mut self) -> Result<ApplyOutcome> {
        let task_id = self.task_id();
        match self.engine.get_task(task_id).await {
            Ok(detail) => Ok(self.view.apply_snapshot(detail)),
            Err(err) => {
                let err = ConsoleError::from_fetch(task_id, err);
                self.view.record_fetch_error(&err);
                Err(err)
            }
        }
    }

    pub async fn request_stop(&mut self) -> Result<ActionAck> {
        let task_id = self.task_id();
        self.ensure_permitted(TaskAction::Stop).await?;
        self.intents.begin(Intent::Stop)?;

        let result = self
            .engine
            .stop_task(task_id)
            .await
            .map_err(|err| ConsoleError::from_action(task_id, err));
        self.intents
            .settle_with(Intent::Stop, &result, |ack| ack.message.clone());
        self.after_action(Intent::Stop, &result).await;
        result
    }

    /// Re-queue errored results. The task keeps its id and may show lower
    /// progress afterwards; polling resumes if it had stopped on a terminal
    /// status.
    pub async fn request_retry(&mut self) -> Result<ActionAck> {
        let task_id = self.task_id();
        self.ensure_permitted(TaskAction::RetryFailed).await?;
        self.intents.begin(Intent::Retry)?;

        let result = self
            .engine
            .retry_task(task_id)
            .await
            .map_err(|err| ConsoleError::from_action(task_id, err))
            .and_then(|ack| match ack.retry_count {
                Some(0) => Err(ConsoleError::InvalidState {
                    task_id,
                    message: ack.message,
                }),
                _ => Ok(ack),
            });
        self.intents
            .settle_with(Intent::Retry, &result, |ack| ack.message.clone());

        if result.is_ok() {
            self.view.mark_retry_requested();
        }
        self.after_action(Intent::Retry, &result).await;

        let resumable = matches!(
            self.poll_state(),
            PollState::Stopped {
                reason: StopReason::Terminal,
                ..
            }
        );
        if result.is_ok() && resumable {
            self.start_polling();
        }
        result
    }

    /// Gate check against the displayed snapshot. A refusal may come from a
    /// stale view, so the task is re-fetched and the gate asked once more.
    async fn ensure_permitted(&mut self, action: TaskAction) -> Result<()> {
        let Err(refusal) = self.check_gate(action) else {
            return Ok(());
        };
        let task_id = self.task_id();
        debug!(task_id, %action, "gate refused on displayed snapshot; refreshing");
        if let Err(err) = self.refresh().await {
            warn!(task_id, error = %err, "refresh after gate refusal failed");
            return Err(refusal);
        }
        self.check_gate(action)
    }

    fn check_gate(&self, action: TaskAction) -> Result<()> {
        match self.view.task() {
            Some(task) if !self.view.actions().contains(action) => {
                Err(ConsoleError::InvalidState {
                    task_id: task.id,
                    message: format!("cannot {action} a {} task", task.status),
                })
            }
            _ => Ok(()),
        }
    }

    async fn after_action(&mut self, intent: Intent, result: &Result<ActionAck>) {
        let task_id = self.task_id();
        match result {
            Ok(ack) => info!(task_id, %intent, message = %ack.message, "action accepted"),
            Err(err) => warn!(task_id, %intent, error = %err, "action rejected"),
        }

        let refresh = match result {
            Ok(_) => true,
            Err(err) => err.needs_refresh(),
        };
        if refresh {
            if let Err(err) = self.refresh().await {
                warn!(task_id, error = %err, "refresh after action failed");
            }
        }
    }
}
