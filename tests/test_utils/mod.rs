//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{Router, body::Body};
use tempfile::TempDir;

use relay::api::AppState;
use relay::api::app;
use relay::core::AppConfig;
use relay::core::db::{async_db, initialize_db};

pub const TEST_TOKEN: &str = "123456:test-token";

/// Config pointing the completion and Telegram clients at mock
/// servers and the database into `dir`.
pub fn test_config(dir: &TempDir, llm_url: &str, telegram_url: &str) -> AppConfig {
    AppConfig {
        storage_path: dir.path().display().to_string(),
        db_path: dir.path().join("chat_history.db").display().to_string(),
        telegram_token: String::from(TEST_TOKEN),
        telegram_api_base: telegram_url.to_string(),
        webhook_url: None,
        openai_api_hostname: llm_url.to_string(),
        openai_api_key: String::from("test-api-key"),
        openai_model: String::from("llama3-8b-8192"),
        temperature: 0.7,
        max_tokens: 1024,
        system_message: None,
        history_capacity: 10,
        history_retention: Duration::from_secs(60 * 60),
        cooldown: Duration::from_secs(3),
        completion_timeout: Duration::from_secs(5),
        purge_interval: Duration::from_secs(60),
    }
}

/// Creates a test application router backed by a SQLite database in
/// a temporary directory. Keep the returned `TempDir` alive for the
/// duration of the test.
pub async fn test_app(llm_url: &str, telegram_url: &str) -> (Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let config = test_config(&dir, llm_url, telegram_url);

    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_state = AppState::new(db, config);
    (app(Arc::new(RwLock::new(app_state))), dir)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A chat completion response with `content` as the reply
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "llama3-8b-8192",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
