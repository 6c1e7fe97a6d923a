/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for secprobe-adapter tests

use secprobe_adapter::EngineClient;
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> EngineClient {
    EngineClient::new(&server.uri()).expect("client init")
}

/// Token response body as produced by the engine's auth endpoints
#[allow(dead_code)]
pub fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 1800,
        "user": {"id": 1, "username": "auditor", "role": "user"}
    })
}

/// Minimal task body in the engine's wire format
#[allow(dead_code)]
pub fn task_body(id: i64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "target_ip": "192.168.1.20",
        "user_id": 1,
        "status": status,
        "total_cases": 2,
        "completed_cases": 0,
        "passed_count": 0,
        "failed_count": 0,
        "error_count": 0,
        "progress": 0.0,
        "created_at": "2026-01-28T10:00:00"
    })
}
