/*
[INPUT]:  Task ids to watch, ExecutionEngine (get_task / list_tasks), CancellationToken
[OUTPUT]: PollEvent / BoardUpdate streams in fetch-completion order
[POS]:    Tracking layer - the only component that owns timers
[UPDATE]: When poll cadence, liveness rules or teardown guarantees change
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use secprobe_adapter::{ExecutionEngine, Page, Task, TaskDetail, TaskId, TaskQuery, TaskStatus};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ConsoleError;

pub const DETAIL_INTERVAL: Duration = Duration::from_millis(3_000);
pub const LIST_INTERVAL: Duration = Duration::from_millis(5_000);

/// Independent cadences of the detail view and the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    pub detail: Duration,
    pub list: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            detail: DETAIL_INTERVAL,
            list: LIST_INTERVAL,
        }
    }
}

impl PollCadence {
    pub fn from_millis(detail_ms: u64, list_ms: u64) -> Self {
        Self {
            detail: Duration::from_millis(detail_ms),
            list: Duration::from_millis(list_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Last observed status was terminal
    Terminal,
    /// Explicit cancel or teardown
    Cancelled,
    /// Nobody is listening for events anymore
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { generation: u64 },
    Stopped { generation: u64, reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStart {
    Started { generation: u64 },
    AlreadyPolling { generation: u64 },
}

/// What the loop does after a fetch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Schedule(Duration),
    Stop,
    /// Response belongs to a generation that is no longer live
    Discard,
}

/// Per-task poll state machine.
///
/// Every `start` from a non-polling state opens a new generation; responses
/// are checked against the current state, never against what a loop captured
/// when it was spawned.
#[derive(Debug, Clone)]
pub struct PollMachine {
    state: PollState,
    last_generation: u64,
    interval: Duration,
}

impl PollMachine {
    pub fn new(interval: Duration) -> Self {
        Self::after_generation(interval, 0)
    }

    /// Machine whose first `start` opens generation `last_generation + 1`.
    pub fn after_generation(interval: Duration, last_generation: u64) -> Self {
        Self {
            state: PollState::Idle,
            last_generation,
            interval,
        }
    }

    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.state, PollState::Polling { .. })
    }

    pub fn start(&mut self) -> PollStart {
        if let PollState::Polling { generation } = self.state {
            return PollStart::AlreadyPolling { generation };
        }
        self.last_generation += 1;
        let generation = self.last_generation;
        self.state = PollState::Polling { generation };
        PollStart::Started { generation }
    }

    /// Stop polling. Returns `false` if nothing was polling.
    pub fn cancel(&mut self) -> bool {
        self.stop(StopReason::Cancelled)
    }

    pub fn stop(&mut self, reason: StopReason) -> bool {
        match self.state {
            PollState::Polling { generation } => {
                self.state = PollState::Stopped { generation, reason };
                true
            }
            _ => false,
        }
    }

    pub fn is_live(&self, generation: u64) -> bool {
        self.state == PollState::Polling { generation }
    }

    /// Whether an event of `generation` may still reach the view: the live
    /// generation, or the one that just observed a terminal status.
    pub fn accepts(&self, generation: u64) -> bool {
        match self.state {
            PollState::Polling { generation: live } => live == generation,
            PollState::Stopped {
                generation: last,
                reason: StopReason::Terminal,
            } => last == generation,
            _ => false,
        }
    }

    pub fn on_status(&mut self, generation: u64, status: TaskStatus) -> PollDecision {
        if !self.is_live(generation) {
            return PollDecision::Discard;
        }
        if status.is_terminal() {
            self.stop(StopReason::Terminal);
            PollDecision::Stop
        } else {
            PollDecision::Schedule(self.interval)
        }
    }

    /// Failures keep the loop alive at the same cadence.
    pub fn on_fetch_error(&mut self, generation: u64) -> PollDecision {
        if !self.is_live(generation) {
            return PollDecision::Discard;
        }
        PollDecision::Schedule(self.interval)
    }
}

#[derive(Debug)]
pub enum PollUpdate {
    Snapshot(TaskDetail),
    Failed(ConsoleError),
}

#[derive(Debug)]
pub struct PollEvent {
    pub task_id: TaskId,
    pub generation: u64,
    pub update: PollUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { generation: u64 },
    AlreadyPolling { generation: u64 },
    /// No tokio runtime on this thread; nothing was scheduled
    NoRuntime,
}

#[derive(Debug)]
struct Watch {
    machine: PollMachine,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl Watch {
    fn release(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

type Watches = Arc<Mutex<HashMap<TaskId, Watch>>>;

fn lock_watches(watches: &Watches) -> MutexGuard<'_, HashMap<TaskId, Watch>> {
    watches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Detail-view poller: one loop per watched task, at most one pending
/// wake-up per task.
///
/// A cancelled task is forgotten entirely; only tasks that are polling or
/// stopped on a terminal status keep an entry. Generations never repeat
/// within one poller, even across forgotten entries.
///
/// Dropping the poller cancels every loop.
pub struct TaskPoller<E: ?Sized> {
    engine: Arc<E>,
    interval: Duration,
    watches: Watches,
    retired_generation: AtomicU64,
    events: mpsc::UnboundedSender<PollEvent>,
    shutdown: CancellationToken,
}

impl<E> TaskPoller<E>
where
    E: ExecutionEngine + ?Sized + 'static,
{
    pub fn new(engine: Arc<E>, interval: Duration) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        Self::with_shutdown(engine, interval, CancellationToken::new())
    }

    /// Loops also stop when `shutdown` (or any parent of it) is cancelled.
    pub fn with_shutdown(
        engine: Arc<E>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let poller = Self {
            engine,
            interval,
            watches: Arc::new(Mutex::new(HashMap::new())),
            retired_generation: AtomicU64::new(0),
            events,
            shutdown,
        };
        (poller, receiver)
    }

    /// Begin watching a task: fetch now, then every interval while active.
    /// Idempotent while the task is already being polled.
    pub fn start(&self, task_id: TaskId) -> StartOutcome {
        let Ok(runtime) = Handle::try_current() else {
            warn!(task_id, "no tokio runtime; poll not started");
            return StartOutcome::NoRuntime;
        };

        let mut watches = lock_watches(&self.watches);
        let watch = watches.entry(task_id).or_insert_with(|| Watch {
            machine: PollMachine::after_generation(
                self.interval,
                self.retired_generation.load(Ordering::SeqCst),
            ),
            cancel: None,
            handle: None,
        });

        let generation = match watch.machine.start() {
            PollStart::AlreadyPolling { generation } => {
                debug!(task_id, generation, "already polling");
                return StartOutcome::AlreadyPolling { generation };
            }
            PollStart::Started { generation } => generation,
        };

        watch.release();
        let token = self.shutdown.child_token();
        watch.cancel = Some(token.clone());
        watch.handle = Some(runtime.spawn(run_watch(
            self.engine.clone(),
            self.watches.clone(),
            self.events.clone(),
            task_id,
            generation,
            token,
        )));

        debug!(task_id, generation, interval_ms = self.interval.as_millis() as u64, "poll started");
        StartOutcome::Started { generation }
    }

    /// Stop watching a task and forget it. Any response still in flight is
    /// discarded. Returns `false` if the task was not polling.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let Some(mut watch) = lock_watches(&self.watches).remove(&task_id) else {
            return false;
        };
        let was_polling = watch.machine.cancel();
        self.retire(&mut watch);
        if was_polling {
            debug!(task_id, "poll cancelled");
        }
        was_polling
    }

    pub fn cancel_all(&self) {
        let drained: Vec<Watch> = lock_watches(&self.watches)
            .drain()
            .map(|(_, watch)| watch)
            .collect();
        for mut watch in drained {
            watch.machine.cancel();
            self.retire(&mut watch);
        }
    }

    fn retire(&self, watch: &mut Watch) {
        watch.release();
        self.retired_generation
            .fetch_max(watch.machine.last_generation(), Ordering::SeqCst);
    }

    pub fn state(&self, task_id: TaskId) -> PollState {
        lock_watches(&self.watches)
            .get(&task_id)
            .map_or(PollState::Idle, |watch| watch.machine.state())
    }

    pub fn is_polling(&self, task_id: TaskId) -> bool {
        matches!(self.state(task_id), PollState::Polling { .. })
    }

    /// Whether an event may still be applied to the view.
    pub fn accepts(&self, event: &PollEvent) -> bool {
        lock_watches(&self.watches)
            .get(&event.task_id)
            .is_some_and(|watch| watch.machine.accepts(event.generation))
    }

    /// Number of tasks the poller still holds state for.
    pub fn tracked_count(&self) -> usize {
        lock_watches(&self.watches).len()
    }

    /// Number of tasks with a live loop.
    pub fn polling_count(&self) -> usize {
        lock_watches(&self.watches)
            .values()
            .filter(|watch| watch.machine.is_polling())
            .count()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<E: ?Sized> Drop for TaskPoller<E> {
    fn drop(&mut self) {
        let mut watches = lock_watches(&self.watches);
        for (_, mut watch) in watches.drain() {
            watch.machine.cancel();
            watch.release();
        }
    }
}

async fn run_watch<E>(
    engine: Arc<E>,
    watches: Watches,
    events: mpsc::UnboundedSender<PollEvent>,
    task_id: TaskId,
    generation: u64,
    cancel: CancellationToken,
) where
    E: ExecutionEngine + ?Sized,
{
    loop {
        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = engine.get_task(task_id) => fetched,
        };

        let decision = {
            let mut guard = lock_watches(&watches);
            let Some(watch) = guard.get_mut(&task_id) else {
                break;
            };

            let decision = match &fetched {
                Ok(detail) => watch.machine.on_status(generation, detail.task.status),
                Err(_) => watch.machine.on_fetch_error(generation),
            };
            if decision == PollDecision::Discard {
                debug!(task_id, generation, "discarding response of a stale poll");
                break;
            }

            let update = match fetched {
                Ok(detail) => {
                    debug!(
                        task_id,
                        generation,
                        status = %detail.task.status,
                        progress = detail.task.progress,
                        "task snapshot"
                    );
                    PollUpdate::Snapshot(detail)
                }
                Err(err) => {
                    warn!(task_id, generation, error = %err, "task fetch failed; will retry");
                    PollUpdate::Failed(ConsoleError::from_fetch(task_id, err))
                }
            };

            // Sent under the lock so a concurrent cancel cannot slip in between
            // the liveness check and the send.
            let event = PollEvent {
                task_id,
                generation,
                update,
            };
            if events.send(event).is_err() {
                watch.machine.stop(StopReason::Closed);
                break;
            }
            decision
        };

        match decision {
            PollDecision::Schedule(delay) => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            PollDecision::Stop | PollDecision::Discard => break,
        }
    }
    debug!(task_id, generation, "poll loop exited");
}

#[derive(Debug)]
pub enum BoardUpdate {
    Page(Page<Task>),
    Failed(ConsoleError),
}

/// Task-list refresher at the list cadence. Runs until cancelled or dropped.
#[derive(Debug)]
pub struct BoardPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BoardPoller {
    /// Must be called from within a tokio runtime.
    pub fn spawn<E>(
        engine: Arc<E>,
        query: TaskQuery,
        interval: Duration,
        shutdown: &CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<BoardUpdate>)
    where
        E: ExecutionEngine + ?Sized + 'static,
    {
        let (updates, receiver) = mpsc::unbounded_channel();
        let cancel = shutdown.child_token();
        let handle = tokio::spawn(run_board(engine, query, interval, updates, cancel.clone()));
        (Self { cancel, handle }, receiver)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for BoardPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_board<E>(
    engine: Arc<E>,
    query: TaskQuery,
    interval: Duration,
    updates: mpsc::UnboundedSender<BoardUpdate>,
    cancel: CancellationToken,
) where
    E: ExecutionEngine + ?Sized,
{
    loop {
        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = engine.list_tasks(&query) => fetched,
        };
        let update = match fetched {
            Ok(page) => BoardUpdate::Page(page),
            Err(err) => {
                warn!(error = %err, "task list refresh failed; will retry");
                BoardUpdate::Failed(ConsoleError::from_engine(err))
            }
        };
        if cancel.is_cancelled() || updates.send(update).is_err() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("task list refresh stopped");
}
