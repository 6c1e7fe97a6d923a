/*
[INPUT]:  Mock authentication responses
[OUTPUT]: Test results for auth flow
[POS]:    Integration tests - authentication
[UPDATE]: When auth endpoints or flow changes
*/

mod common;

use common::{client_for, setup_mock_server, task_body, token_body};
use secprobe_adapter::{EngineError, TokenStore};
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_login_stores_tokens() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(serde_json::json!({
            "username": "auditor",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.login("auditor", "s3cret").await);

    assert_eq!(response.access_token, "access-1");
    assert_eq!(client.tokens().access_token(), Some("access-1".to_string()));
    assert_eq!(client.tokens().refresh_token(), Some("refresh-1".to_string()));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Incorrect username or password"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.login("auditor", "wrong").await.expect_err("login must fail");
    assert!(matches!(err, EngineError::Unauthorized));
    assert!(client.tokens().access_token().is_none());
}

#[tokio::test]
async fn test_bearer_header_attached() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/5"))
        .and(header("authorization", "Bearer static-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(5, "running")))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::new();
    tokens.set_access_token("static-token");
    let client = client_for(&server).with_tokens(tokens);

    let detail = assert_ok!(client.get_task(5).await);
    assert_eq!(detail.task.id, 5);
    assert!(detail.results.is_empty());
}

#[tokio::test]
async fn test_expired_access_token_refreshed_once() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/5"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(serde_json::json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/5"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(5, "completed")))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::new();
    tokens.set_tokens("stale", Some("refresh-1".to_string()), Some(60));
    let client = client_for(&server).with_tokens(tokens.clone());

    let detail = assert_ok!(client.get_task(5).await);
    assert_eq!(detail.task.id, 5);
    assert_eq!(tokens.access_token(), Some("fresh".to_string()));
    assert_eq!(tokens.refresh_token(), Some("refresh-2".to_string()));
}

#[tokio::test]
async fn test_failed_refresh_clears_session() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/5"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Invalid refresh token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::new();
    tokens.set_tokens("stale", Some("revoked".to_string()), None);
    let client = client_for(&server).with_tokens(tokens.clone());

    let err = client.get_task(5).await.expect_err("must be unauthorized");
    assert!(matches!(err, EngineError::Unauthorized));
    assert!(tokens.token_data().is_none());
}
