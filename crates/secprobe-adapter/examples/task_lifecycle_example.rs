/*
[INPUT]:  Engine base URL, credentials and target address from the environment
[OUTPUT]: Created task and its status until it reaches a terminal state
[POS]:    Examples - raw task lifecycle calls without the console core
[UPDATE]: When task endpoints change
*/

use std::time::Duration;

use secprobe_adapter::*;

/// Example: run every enabled case against a target and wait for the outcome
///
/// Uses SECPROBE_USER / SECPROBE_PASSWORD to log in when both are set.
#[tokio::main]
async fn main() {
    println!("=== Secprobe Task Lifecycle Example ===\n");

    let base_url = std::env::var("SECPROBE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let target = std::env::var("SECPROBE_TARGET").unwrap_or_else(|_| "127.0.0.1".to_string());

    let client = match EngineClient::new(&base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    if let (Ok(user), Ok(password)) = (
        std::env::var("SECPROBE_USER"),
        std::env::var("SECPROBE_PASSWORD"),
    ) {
        match client.login(&user, &password).await {
            Ok(_) => println!("✓ Logged in as {}", user),
            Err(e) => {
                println!("✗ Login failed: {}", e);
                return;
            }
        }
    }

    let request = CreateTaskRequest {
        target_ip: target,
        description: Some("adapter example".to_string()),
        case_ids: None,
    };
    let task = match client.create_task(&request).await {
        Ok(task) => task,
        Err(e) => {
            println!("✗ Error creating task: {}", e);
            return;
        }
    };
    println!("✓ Task #{} created ({})", task.id, task.status);

    loop {
        match client.get_task(task.id).await {
            Ok(detail) => {
                println!(
                    "  status={} progress={:.1}% ({}/{})",
                    detail.task.status,
                    detail.task.progress,
                    detail.task.completed_cases,
                    detail.task.total_cases
                );
                if detail.task.status.is_terminal() {
                    break;
                }
            }
            Err(e) => println!("  ✗ poll failed: {}", e),
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    println!("\n✓ Task lifecycle example complete");
}
