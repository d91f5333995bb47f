//! Integration tests for the Telegram webhook

mod test_utils;

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::test_utils::{TEST_TOKEN, completion_body, test_app};

    fn update(chat_id: i64, text: &str) -> Value {
        json!({
            "update_id": 1,
            "message": {
                "message_id": 7,
                "date": 1704067200,
                "chat": {"id": chat_id, "type": "private"},
                "text": text
            }
        })
    }

    async fn post_update(app: &Router, token: &str, update: Value) -> StatusCode {
        app.clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/telegram/{}", token))
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(update.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    /// Replies are sent from a background task so give it a moment
    async fn wait_until_matched(mock: &mockito::Mock) {
        for _ in 0..200 {
            if mock.matched_async().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// Tests the webhook is hidden behind the bot token
    #[tokio::test]
    async fn it_rejects_unknown_token() {
        let mut telegram = mockito::Server::new_async().await;
        let send = telegram
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create();
        let (app, _dir) = test_app("http://127.0.0.1:9", &telegram.url()).await;

        let status = post_update(&app, "wrong-token", update(42, "hi")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        send.assert();
    }

    /// Tests /start replies with the greeting without calling the LLM
    #[tokio::test]
    async fn it_greets_on_start() {
        let mut llm = mockito::Server::new_async().await;
        let completion = llm
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create();
        let mut telegram = mockito::Server::new_async().await;
        let send = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({
                "chat_id": 42,
                "text": "Hi! I'm your AI assistant. How can I help you today?"
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let (app, _dir) = test_app(&llm.url(), &telegram.url()).await;

        let status = post_update(&app, TEST_TOKEN, update(42, "/start")).await;
        assert_eq!(status, StatusCode::OK);
        wait_until_matched(&send).await;
        send.assert();
        completion.assert();
    }

    /// Tests a text message is relayed to the LLM and the reply sent back
    #[tokio::test]
    async fn it_relays_text_messages() {
        let mut llm = mockito::Server::new_async().await;
        let completion = llm
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({
                "messages": [{"role": "user", "content": "What is Rust?"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("A systems programming language."))
            .create();
        let mut telegram = mockito::Server::new_async().await;
        let typing = telegram
            .mock("POST", format!("/bot{}/sendChatAction", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({"chat_id": 42, "action": "typing"})))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create();
        let send = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({
                "chat_id": 42,
                "text": "A systems programming language."
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let (app, _dir) = test_app(&llm.url(), &telegram.url()).await;

        let status = post_update(&app, TEST_TOKEN, update(42, "What is Rust?")).await;
        assert_eq!(status, StatusCode::OK);
        wait_until_matched(&send).await;
        completion.assert();
        typing.assert();
        send.assert();
    }

    /// Tests the user gets an apology when the LLM call fails
    #[tokio::test]
    async fn it_apologizes_when_completion_fails() {
        let mut llm = mockito::Server::new_async().await;
        let _completion = llm
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create();
        let mut telegram = mockito::Server::new_async().await;
        let _typing = telegram
            .mock("POST", format!("/bot{}/sendChatAction", TEST_TOKEN).as_str())
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create();
        let send = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({
                "chat_id": 7,
                "text": "Sorry, I encountered an error. Please try again."
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let (app, _dir) = test_app(&llm.url(), &telegram.url()).await;

        let status = post_update(&app, TEST_TOKEN, update(7, "hello")).await;
        assert_eq!(status, StatusCode::OK);
        wait_until_matched(&send).await;
        send.assert();
    }

    /// Tests Telegram gets its 200 before a slow completion finishes
    #[tokio::test]
    async fn it_acknowledges_before_the_completion_finishes() {
        let mut llm = mockito::Server::new_async().await;
        let body = completion_body("Worth the wait.");
        let _completion = llm
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(move |w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(body.as_bytes())
            })
            .create();
        let mut telegram = mockito::Server::new_async().await;
        let _typing = telegram
            .mock("POST", format!("/bot{}/sendChatAction", TEST_TOKEN).as_str())
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create();
        let send = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({
                "chat_id": 11,
                "text": "Worth the wait."
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let (app, _dir) = test_app(&llm.url(), &telegram.url()).await;

        let started = Instant::now();
        let status = post_update(&app, TEST_TOKEN, update(11, "take your time")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "webhook answered after {:?}",
            started.elapsed()
        );

        // The reply still arrives once the completion is done
        wait_until_matched(&send).await;
        send.assert();
    }

    /// Tests a throttled message is answered without a typing indicator
    #[tokio::test]
    async fn it_skips_typing_for_throttled_messages() {
        let mut llm = mockito::Server::new_async().await;
        let completion = llm
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("First!"))
            .expect(1)
            .create();
        let mut telegram = mockito::Server::new_async().await;
        let typing = telegram
            .mock("POST", format!("/bot{}/sendChatAction", TEST_TOKEN).as_str())
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .expect(1)
            .create();
        let throttled = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({
                "chat_id": 12,
                "text": "You're sending messages too quickly. Please wait a moment."
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let replied = telegram
            .mock("POST", format!("/bot{}/sendMessage", TEST_TOKEN).as_str())
            .match_body(mockito::Matcher::Json(json!({"chat_id": 12, "text": "First!"})))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create();
        let (app, _dir) = test_app(&llm.url(), &telegram.url()).await;

        assert_eq!(post_update(&app, TEST_TOKEN, update(12, "one")).await, StatusCode::OK);
        assert_eq!(post_update(&app, TEST_TOKEN, update(12, "two")).await, StatusCode::OK);

        wait_until_matched(&throttled).await;
        wait_until_matched(&replied).await;
        throttled.assert();
        replied.assert();
        typing.assert();
        completion.assert();
    }

    /// Tests unsupported commands are acknowledged but not answered
    #[tokio::test]
    async fn it_ignores_other_commands() {
        let mut telegram = mockito::Server::new_async().await;
        let send = telegram
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create();
        let (app, _dir) = test_app("http://127.0.0.1:9", &telegram.url()).await;

        let status = post_update(&app, TEST_TOKEN, update(42, "/help")).await;
        assert_eq!(status, StatusCode::OK);
        send.assert();
    }
}
