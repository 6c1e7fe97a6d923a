/*
[INPUT]:  ExecutionEngine (list_cases, list_categories, list_tasks)
[OUTPUT]: DashboardSummary with catalog totals and recent task counts
[POS]:    Overview layer - one-shot snapshot for the summary command
[UPDATE]: When the overview gains counters or the recent window changes
*/

use secprobe_adapter::{CaseQuery, ExecutionEngine, Task, TaskQuery, TaskStatus};
use tracing::debug;

use crate::error::Result;

/// Recent tasks the overview looks at.
pub const RECENT_TASKS: u32 = 10;
/// Recent tasks the overview lists individually.
pub const RECENT_SHOWN: usize = 5;

/// Catalog totals plus status counts over the most recent tasks.
///
/// Counts cover only the recent window, not every task the engine knows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_cases: u32,
    pub total_categories: u32,
    pub recent: Vec<Task>,
}

impl DashboardSummary {
    pub async fn fetch<E>(engine: &E) -> Result<Self>
    where
        E: ExecutionEngine + ?Sized,
    {
        let cases = engine
            .list_cases(&CaseQuery {
                page_size: 1,
                ..CaseQuery::default()
            })
            .await?;
        let categories = engine.list_categories().await?;
        let recent = engine
            .list_tasks(&TaskQuery {
                page_size: RECENT_TASKS,
                ..TaskQuery::default()
            })
            .await?;

        debug!(
            total_cases = cases.total,
            total_categories = categories.total,
            recent = recent.items.len(),
            "dashboard summary loaded"
        );
        Ok(Self {
            total_cases: cases.total,
            total_categories: categories.total,
            recent: recent.items,
        })
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.recent.iter().filter(|task| task.status == status).count()
    }

    pub fn running(&self) -> usize {
        self.count(TaskStatus::Running)
    }

    pub fn completed(&self) -> usize {
        self.count(TaskStatus::Completed)
    }

    pub fn shown(&self) -> &[Task] {
        &self.recent[..self.recent.len().min(RECENT_SHOWN)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::fixtures::task;

    #[test]
    fn test_counts_cover_recent_window() {
        let summary = DashboardSummary {
            total_cases: 42,
            total_categories: 6,
            recent: vec![
                task(1, TaskStatus::Running, 40.0, 0),
                task(2, TaskStatus::Completed, 100.0, 0),
                task(3, TaskStatus::Completed, 100.0, 1),
                task(4, TaskStatus::Error, 100.0, 3),
                task(5, TaskStatus::Pending, 0.0, 0),
                task(6, TaskStatus::Running, 10.0, 0),
            ],
        };
        assert_eq!(summary.running(), 2);
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.count(TaskStatus::Stopped), 0);
        assert_eq!(summary.shown().len(), RECENT_SHOWN);
        assert_eq!(summary.shown()[0].id, 1);
    }
}
