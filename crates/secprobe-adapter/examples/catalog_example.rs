/*
[INPUT]:  Engine base URL and bearer token from the environment
[OUTPUT]: Enabled cases grouped by category
[POS]:    Examples - read-only catalog queries
[UPDATE]: When catalog endpoints change
*/

use secprobe_adapter::*;

/// Example: list the case catalog
///
/// SECPROBE_URL defaults to the local engine; SECPROBE_TOKEN is optional.
#[tokio::main]
async fn main() {
    println!("=== Secprobe Catalog Example ===\n");

    let base_url = std::env::var("SECPROBE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let client = match EngineClient::new(&base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    if let Ok(token) = std::env::var("SECPROBE_TOKEN") {
        client.tokens().set_access_token(token);
    }

    let categories = match client.list_categories().await {
        Ok(list) => list.items,
        Err(e) => {
            println!("✗ Error listing categories: {}", e);
            return;
        }
    };

    let query = CaseQuery {
        is_enabled: Some(true),
        ..CaseQuery::default()
    };
    let cases = match client.list_cases(&query).await {
        Ok(page) => page.items,
        Err(e) => {
            println!("✗ Error listing cases: {}", e);
            return;
        }
    };

    for category in &categories {
        println!("{} (#{})", category.name, category.id);
        for case in cases.iter().filter(|case| case.category_id == category.id) {
            println!("  - [{}] {} (#{})", case.risk_level.as_str(), case.name, case.id);
        }
    }

    println!("\n✓ Catalog example complete");
}
