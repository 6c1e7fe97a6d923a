/*
[INPUT]:  Engine operations required by task composition and tracking
[OUTPUT]: ExecutionEngine trait + EngineClient implementation
[POS]:    Seam between the console core and the HTTP transport
[UPDATE]: When the console needs a new engine operation
*/

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{EngineClient, Result};
use crate::types::{
    ActionAck, Case, CaseQuery, CategoryList, CreateTaskRequest, Page, ReportFormat, Task,
    TaskDetail, TaskId, TaskQuery,
};

/// Logical operations offered by the remote execution engine.
///
/// Transport and encoding stay behind this trait; callers only see typed values
/// and [`EngineError`](crate::EngineError).
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task>;

    async fn get_task(&self, task_id: TaskId) -> Result<TaskDetail>;

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>>;

    async fn stop_task(&self, task_id: TaskId) -> Result<ActionAck>;

    async fn retry_task(&self, task_id: TaskId) -> Result<ActionAck>;

    async fn list_cases(&self, query: &CaseQuery) -> Result<Page<Case>>;

    async fn list_categories(&self) -> Result<CategoryList>;

    async fn export_report(&self, task_id: TaskId, format: ReportFormat) -> Result<Vec<u8>>;
}

#[async_trait]
impl ExecutionEngine for EngineClient {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        EngineClient::create_task(self, request).await
    }

    async fn get_task(&self, task_id: TaskId) -> Result<TaskDetail> {
        EngineClient::get_task(self, task_id).await
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>> {
        EngineClient::list_tasks(self, query).await
    }

    async fn stop_task(&self, task_id: TaskId) -> Result<ActionAck> {
        EngineClient::stop_task(self, task_id).await
    }

    async fn retry_task(&self, task_id: TaskId) -> Result<ActionAck> {
        EngineClient::retry_task(self, task_id).await
    }

    async fn list_cases(&self, query: &CaseQuery) -> Result<Page<Case>> {
        EngineClient::list_cases(self, query).await
    }

    async fn list_categories(&self) -> Result<CategoryList> {
        EngineClient::list_categories(self).await
    }

    async fn export_report(&self, task_id: TaskId, format: ReportFormat) -> Result<Vec<u8>> {
        EngineClient::export_report(self, task_id, format).await
    }
}

#[async_trait]
impl<E> ExecutionEngine for Arc<E>
where
    E: ExecutionEngine + ?Sized,
{
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        (**self).create_task(request).await
    }

    async fn get_task(&self, task_id: TaskId) -> Result<TaskDetail> {
        (**self).get_task(task_id).await
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>> {
        (**self).list_tasks(query).await
    }

    async fn stop_task(&self, task_id: TaskId) -> Result<ActionAck> {
        (**self).stop_task(task_id).await
    }

    async fn retry_task(&self, task_id: TaskId) -> Result<ActionAck> {
        (**self).retry_task(task_id).await
    }

    async fn list_cases(&self, query: &CaseQuery) -> Result<Page<Case>> {
        (**self).list_cases(query).await
    }

    async fn list_categories(&self) -> Result<CategoryList> {
        (**self).list_categories().await
    }

    async fn export_report(&self, task_id: TaskId, format: ReportFormat) -> Result<Vec<u8>> {
        (**self).export_report(task_id, format).await
    }
}
