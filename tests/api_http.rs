//! HTTP API Integration Tests
//!
//! Drives the `/scripts/v1` endpoints of a running server over real sockets:
//! - default selection across add, update and delete
//! - authentication on mutating routes
//! - reference validation and not-found handling
//! - health and request ID plumbing

mod common;

use common::{TEST_API_KEY, TestContext, script_url, video_url, wait_for_server};
use serde_json::{Value, json};

const VIDEO: &str = "https://videos.example.com/watch?v=abc123";
const SCRIPT_A: &str = "https://scripts.example.com/a.funscript";
const SCRIPT_B: &str = "https://scripts.example.com/b.csv";
const SCRIPT_C: &str = "https://scripts.example.com/nested/c.funscript";

async fn start() -> (TestContext, u16) {
    let context = TestContext::new();
    let port = context
        .start_server()
        .await
        .expect("server failed to start");
    wait_for_server(port, 20).await.expect("Server not ready");
    (context, port)
}

async fn post_script(
    client: &reqwest::Client,
    port: u16,
    script: &str,
    metadata: Value,
) -> reqwest::Response {
    client
        .post(script_url(port, VIDEO, script))
        .header("X-API-Key", TEST_API_KEY)
        .json(&json!({ "metadata": metadata }))
        .send()
        .await
        .expect("upsert request failed")
}

async fn delete_script(client: &reqwest::Client, port: u16, script: &str) -> reqwest::Response {
    client
        .delete(script_url(port, VIDEO, script))
        .header("X-API-Key", TEST_API_KEY)
        .send()
        .await
        .expect("delete request failed")
}

async fn list(client: &reqwest::Client, port: u16) -> reqwest::Response {
    client
        .get(video_url(port, VIDEO))
        .send()
        .await
        .expect("list request failed")
}

fn default_keys(collection: &Value) -> Vec<String> {
    collection
        .as_object()
        .expect("collection should be an object")
        .iter()
        .filter(|(_, record)| record["isDefault"] == true)
        .map(|(key, _)| key.clone())
        .collect()
}

// ============================================================================
// Default selection
// ============================================================================

#[tokio::test]
async fn test_default_follows_adds_and_deletes() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = post_script(&client, port, SCRIPT_A, json!({"name": "A"})).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Script metadata updated");
    assert_eq!(body["data"]["name"], "A");
    assert_eq!(body["data"]["isDefault"], true);
    assert!(body["data"]["lastUpdated"].is_string());

    let response = post_script(
        &client,
        port,
        SCRIPT_B,
        json!({"name": "B", "creator": "someone", "isDefault": true}),
    )
    .await;
    assert_eq!(response.status(), 200);

    let collection: Value = list(&client, port).await.json().await.unwrap();
    assert_eq!(default_keys(&collection), vec![SCRIPT_B.to_string()]);
    assert_eq!(collection[SCRIPT_A]["isDefault"], false);
    assert_eq!(collection[SCRIPT_B]["creator"], "someone");

    post_script(&client, port, SCRIPT_C, json!({"name": "C"})).await;

    let response = delete_script(&client, port, SCRIPT_B).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Script removed");

    // A was registered first, so it takes over
    let collection: Value = list(&client, port).await.json().await.unwrap();
    assert_eq!(default_keys(&collection), vec![SCRIPT_A.to_string()]);
    assert_eq!(collection.as_object().unwrap().len(), 2);

    delete_script(&client, port, SCRIPT_A).await;
    let response = delete_script(&client, port, SCRIPT_C).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "All scripts for video removed");

    let response = list(&client, port).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No scripts found for this video");

    context.cleanup().await.expect("Failed to cleanup");
}

#[tokio::test]
async fn test_update_merges_metadata() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    post_script(
        &client,
        port,
        SCRIPT_A,
        json!({"name": "A", "creator": "first", "supportUrl": "https://support.example.com/a"}),
    )
    .await;
    let response = post_script(&client, port, SCRIPT_A, json!({"name": "Renamed"})).await;
    assert_eq!(response.status(), 200);

    let collection: Value = list(&client, port).await.json().await.unwrap();
    let record = &collection[SCRIPT_A];
    assert_eq!(record["name"], "Renamed");
    assert_eq!(record["creator"], "first");
    assert_eq!(record["supportUrl"], "https://support.example.com/a");
    assert_eq!(record["isDefault"], true);

    context.cleanup().await.expect("Failed to cleanup");
}

#[tokio::test]
async fn test_clearing_default_keeps_one() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    post_script(&client, port, SCRIPT_A, json!({"name": "A"})).await;
    post_script(&client, port, SCRIPT_B, json!({"name": "B"})).await;
    post_script(&client, port, SCRIPT_A, json!({"isDefault": false})).await;

    let collection: Value = list(&client, port).await.json().await.unwrap();
    assert_eq!(default_keys(&collection).len(), 1);

    context.cleanup().await.expect("Failed to cleanup");
}

#[tokio::test]
async fn test_reference_with_literal_percent() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();
    let video = "https://videos.example.com/clip%20one";
    let script = "https://scripts.example.com/50%25.funscript";

    let response = client
        .post(script_url(port, video, script))
        .header("X-API-Key", TEST_API_KEY)
        .json(&json!({"metadata": {"name": "Half"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client.get(video_url(port, video)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let collection: Value = response.json().await.unwrap();
    assert_eq!(collection[script]["name"], "Half");

    // the once-decoded form is a different video
    let response = client
        .get(video_url(port, "https://videos.example.com/clip one"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(script_url(port, video, script))
        .header("X-API-Key", TEST_API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    context.cleanup().await.expect("Failed to cleanup");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_mutations_require_api_key() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(script_url(port, VIDEO, SCRIPT_A))
        .json(&json!({"metadata": {"name": "A"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let response = client
        .delete(script_url(port, VIDEO, SCRIPT_A))
        .header("X-API-Key", "not-the-key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Nothing was written
    assert_eq!(list(&client, port).await.status(), 404);

    context.cleanup().await.expect("Failed to cleanup");
}

// ============================================================================
// Validation and not-found
// ============================================================================

#[tokio::test]
async fn test_invalid_references_rejected() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(video_url(port, "not a url"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid video URL format");

    let response = post_script(
        &client,
        port,
        "https://scripts.example.com/a.txt",
        json!({"name": "A"}),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid script URL format. Must end with .funscript or .csv"
    );

    let response = post_script(
        &client,
        port,
        SCRIPT_A,
        json!({"name": "A", "supportUrl": "nope"}),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid support URL format");

    assert_eq!(list(&client, port).await.status(), 404);

    context.cleanup().await.expect("Failed to cleanup");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(script_url(port, VIDEO, SCRIPT_A))
        .header("X-API-Key", TEST_API_KEY)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // New records need a name
    let response = post_script(&client, port, SCRIPT_A, json!({"creator": "x"})).await;
    assert_eq!(response.status(), 400);

    context.cleanup().await.expect("Failed to cleanup");
}

#[tokio::test]
async fn test_delete_unknown_script() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = delete_script(&client, port, SCRIPT_A).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No scripts found for this video");

    post_script(&client, port, SCRIPT_A, json!({"name": "A"})).await;
    let response = delete_script(&client, port, SCRIPT_B).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Script not found");

    context.cleanup().await.expect("Failed to cleanup");
}

// ============================================================================
// Health and request IDs
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (context, port) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .header("X-Request-Id", "health-check-1")
        .send()
        .await
        .expect("Health check request failed");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["x-request-id"].to_str().unwrap(),
        "health-check-1"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["store_status"], "ok");
    assert!(body["timestamp"].is_string());
    assert!(body["version"]["cargo"].is_string());

    context.cleanup().await.expect("Failed to cleanup");
}
