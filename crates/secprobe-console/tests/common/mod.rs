/*
[INPUT]:  Scripted engine responses and wire fixtures
[OUTPUT]: In-process ExecutionEngine double plus JSON bodies for wiremock
[POS]:    Test infrastructure - shared across console integration tests
[UPDATE]: When the ExecutionEngine trait or wire fixtures change
*/

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use secprobe_adapter::{
    ActionAck, Case, CaseQuery, CategoryList, CreateTaskRequest, EngineError, ExecutionEngine,
    Page, ReportFormat, Result, ResultStatus, Task, TaskDetail, TaskId, TaskQuery, TaskResult,
    TaskStatus,
};

pub fn task(id: TaskId, status: TaskStatus, progress: f64, error_count: u32) -> Task {
    Task {
        id,
        target_ip: "10.0.0.5".to_string(),
        user_id: 1,
        username: Some("admin".to_string()),
        status,
        total_cases: 20,
        completed_cases: (progress / 5.0) as u32,
        passed_count: 0,
        failed_count: 0,
        error_count,
        progress,
        start_time: None,
        end_time: None,
        created_at: Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(),
    }
}

pub fn detail(id: TaskId, status: TaskStatus, progress: f64, error_count: u32) -> TaskDetail {
    TaskDetail {
        task: task(id, status, progress, error_count),
        results: Vec::new(),
    }
}

pub fn with_results(mut detail: TaskDetail, result_ids: &[i64]) -> TaskDetail {
    let task_id = detail.task.id;
    detail.results = result_ids
        .iter()
        .map(|id| TaskResult {
            id: *id,
            task_id,
            case_id: *id * 10,
            case_name: Some(format!("case-{id}")),
            category_name: None,
            risk_level: None,
            status: ResultStatus::Pass,
            retry_count: 0,
            start_time: None,
            end_time: None,
            error_message: None,
        })
        .collect();
    detail
}

pub enum Scripted {
    Detail(TaskDetail),
    Delayed(Duration, TaskDetail),
    Fail(u16),
}

pub enum ScriptedPage {
    Page(Page<Task>),
    Fail(u16),
}

pub fn page(items: Vec<Task>) -> Page<Task> {
    let total = items.len() as u32;
    Page {
        items,
        total,
        page: 1,
        page_size: 20,
    }
}

pub enum ScriptedAck {
    Ack(ActionAck),
    Reject(u16, String),
}

impl ScriptedAck {
    fn into_result(self) -> Result<ActionAck> {
        match self {
            ScriptedAck::Ack(ack) => Ok(ack),
            ScriptedAck::Reject(status, message) => Err(EngineError::Api { status, message }),
        }
    }
}

/// Engine double that answers `get_task` and `list_tasks` from scripts. Once
/// a script is exhausted its last answer is repeated.
#[derive(Default)]
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<TaskDetail>>,
    pages: Mutex<VecDeque<ScriptedPage>>,
    last_page: Mutex<Option<Page<Task>>>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    retry_calls: AtomicUsize,
    stop_ack: Mutex<Option<ScriptedAck>>,
    retry_ack: Mutex<Option<ScriptedAck>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn snapshots(snapshots: Vec<TaskDetail>) -> Self {
        Self::new(snapshots.into_iter().map(Scripted::Detail).collect())
    }

    pub fn pages(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn on_stop(&self, ack: ScriptedAck) {
        *self.stop_ack.lock().unwrap() = Some(ack);
    }

    pub fn on_retry(&self, ack: ScriptedAck) {
        *self.retry_ack.lock().unwrap() = Some(ack);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn retry_calls(&self) -> usize {
        self.retry_calls.load(Ordering::SeqCst)
    }
}

fn unscripted<T>(operation: &str) -> Result<T> {
    Err(EngineError::Config(format!("{operation} is not scripted")))
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn create_task(&self, _request: &CreateTaskRequest) -> Result<Task> {
        unscripted("create_task")
    }

    async fn get_task(&self, _task_id: TaskId) -> Result<TaskDetail> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        let (delay, detail) = match step {
            Some(Scripted::Detail(detail)) => (None, detail),
            Some(Scripted::Delayed(delay, detail)) => (Some(delay), detail),
            Some(Scripted::Fail(status)) => {
                return Err(EngineError::Api {
                    status,
                    message: "upstream unavailable".to_string(),
                });
            }
            None => match self.last.lock().unwrap().clone() {
                Some(detail) => (None, detail),
                None => return unscripted("get_task"),
            },
        };
        *self.last.lock().unwrap() = Some(detail.clone());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(detail)
    }

    async fn list_tasks(&self, _query: &TaskQuery) -> Result<Page<Task>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.pages.lock().unwrap().pop_front();
        let page = match step {
            Some(ScriptedPage::Page(page)) => page,
            Some(ScriptedPage::Fail(status)) => {
                return Err(EngineError::Api {
                    status,
                    message: "upstream unavailable".to_string(),
                });
            }
            None => match self.last_page.lock().unwrap().clone() {
                Some(page) => page,
                None => return unscripted("list_tasks"),
            },
        };
        *self.last_page.lock().unwrap() = Some(page.clone());
        Ok(page)
    }

    async fn stop_task(&self, _task_id: TaskId) -> Result<ActionAck> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        match self.stop_ack.lock().unwrap().take() {
            Some(ack) => ack.into_result(),
            None => unscripted("stop_task"),
        }
    }

    async fn retry_task(&self, _task_id: TaskId) -> Result<ActionAck> {
        self.retry_calls.fetch_add(1, Ordering::SeqCst);
        match self.retry_ack.lock().unwrap().take() {
            Some(ack) => ack.into_result(),
            None => unscripted("retry_task"),
        }
    }

    async fn list_cases(&self, _query: &CaseQuery) -> Result<Page<Case>> {
        unscripted("list_cases")
    }

    async fn list_categories(&self) -> Result<CategoryList> {
        unscripted("list_categories")
    }

    async fn export_report(&self, _task_id: TaskId, _format: ReportFormat) -> Result<Vec<u8>> {
        unscripted("export_report")
    }
}

/// Case body in the engine's wire format
pub fn case_body(id: i64, category_id: i64, enabled: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("case-{id}"),
        "category_id": category_id,
        "risk_level": "high",
        "script_path": format!("checks/case_{id}.py"),
        "is_enabled": enabled,
        "created_at": "2026-01-28T10:00:00",
        "updated_at": "2026-01-28T10:00:00"
    })
}

pub fn category_body(id: i64, name: &str, sort_order: i32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "sort_order": sort_order,
        "created_at": "2026-01-28T10:00:00",
        "updated_at": "2026-01-28T10:00:00"
    })
}

pub fn task_body(id: i64, status: &str, progress: f64, error_count: u32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "target_ip": "10.0.0.5",
        "user_id": 1,
        "status": status,
        "total_cases": 20,
        "completed_cases": (progress / 5.0) as u32,
        "passed_count": 0,
        "failed_count": 0,
        "error_count": error_count,
        "progress": progress,
        "created_at": "2026-01-28T10:00:00"
    })
}

pub fn detail_body(id: i64, status: &str, progress: f64, error_count: u32) -> serde_json::Value {
    let mut body = task_body(id, status, progress, error_count);
    body["results"] = serde_json::json!([]);
    body
}
