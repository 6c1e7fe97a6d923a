/*
[INPUT]:  Engine schema definitions and serde requirements
[OUTPUT]: Typed request bodies and query strings
[POS]:    Data layer - type definitions for engine communication
[UPDATE]: When engine request schema changes
*/

use serde::{Deserialize, Serialize};

use super::enums::{RiskLevel, TaskStatus};
use super::models::{CaseId, CategoryId};

/// Body of `POST /tasks`.
///
/// `case_ids: None` is omitted on the wire and means "run every enabled case",
/// resolved by the engine at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub target_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<CaseId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl Default for CaseQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 100,
            category_id: None,
            risk_level: None,
            is_enabled: None,
            keyword: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ip: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub my_tasks: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            status: None,
            target_ip: None,
            my_tasks: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
