/*
[INPUT]:  Engine schema definitions and serde requirements
[OUTPUT]: Typed Rust structs for cases, categories, tasks and results
[POS]:    Data layer - type definitions for engine communication
[UPDATE]: When engine schema changes or new types added
[UPDATE]: Accept naive engine timestamps as UTC
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ResultStatus, RiskLevel, TaskStatus};

pub type CaseId = i64;
pub type CategoryId = i64;
pub type TaskId = i64;
pub type ResultId = i64;

/// A single security check definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
    #[serde(default)]
    pub script_path: String,
    pub is_enabled: bool,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_count: Option<u32>,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Execution run of a set of cases against one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub target_ip: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub status: TaskStatus,
    pub total_cases: u32,
    pub completed_cases: u32,
    pub passed_count: u32,
    pub failed_count: u32,
    pub error_count: u32,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(with = "serde_helpers::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Outcome of one case within one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: ResultId,
    pub task_id: TaskId,
    pub case_id: CaseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub status: ResultStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::timestamp_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Task plus its full result list, as returned by `GET /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub results: Vec<TaskResult>,
}

impl TaskDetail {
    pub fn result(&self, result_id: ResultId) -> Option<&TaskResult> {
        self.results.iter().find(|result| result.id == result_id)
    }
}

pub(crate) mod serde_helpers {
    use chrono::{DateTime, NaiveDateTime, Utc};

    // The engine emits naive UTC timestamps ("2026-01-28T10:00:00.123456");
    // RFC 3339 values with an offset are accepted as well.
    pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub(crate) mod timestamp {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

        pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&value.to_rfc3339())
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            super::parse_timestamp(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
        }
    }

    pub(crate) mod timestamp_option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_some(&value.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(raw) => super::parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
            }
        }
    }
}
