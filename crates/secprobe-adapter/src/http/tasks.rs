/*
[INPUT]:  Task creation requests, task ids, list filters, bearer credentials
[OUTPUT]: Task snapshots, task details with results, action acknowledgements
[POS]:    HTTP layer - task lifecycle endpoints
[UPDATE]: When task endpoints or acknowledgement payloads change
*/

use reqwest::Method;
use tracing::debug;

use crate::http::{EngineClient, Result};
use crate::types::{ActionAck, CreateTaskRequest, Page, Task, TaskDetail, TaskId, TaskQuery};

impl EngineClient {
    /// Create a new detection task
    ///
    /// POST /api/v1/tasks
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        debug!(
            target_ip = %request.target_ip,
            explicit_cases = request.case_ids.as_ref().map(Vec::len),
            "creating task"
        );
        self.send_json(Method::POST, "tasks", |builder| builder.json(request))
            .await
    }

    /// Fetch one task with its full result list
    ///
    /// GET /api/v1/tasks/{id}
    pub async fn get_task(&self, task_id: TaskId) -> Result<TaskDetail> {
        let endpoint = format!("tasks/{task_id}");
        self.send_json(Method::GET, &endpoint, |builder| builder)
            .await
    }

    /// List tasks, newest first
    ///
    /// GET /api/v1/tasks?page={page}&page_size={page_size}&status=..&target_ip=..&my_tasks=..
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>> {
        self.send_json(Method::GET, "tasks", |builder| builder.query(query))
            .await
    }

    /// Stop a pending or running task
    ///
    /// POST /api/v1/tasks/{id}/stop
    pub async fn stop_task(&self, task_id: TaskId) -> Result<ActionAck> {
        let endpoint = format!("tasks/{task_id}/stop");
        self.send_json(Method::POST, &endpoint, |builder| builder)
            .await
    }

    /// Re-queue the errored results of a terminal task under the same task id
    ///
    /// POST /api/v1/tasks/{id}/retry
    pub async fn retry_task(&self, task_id: TaskId) -> Result<ActionAck> {
        let endpoint = format!("tasks/{task_id}/retry");
        self.send_json(Method::POST, &endpoint, |builder| builder)
            .await
    }
}
