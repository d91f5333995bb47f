use anyhow::{Error, Result, anyhow};
use serde::Serialize;
use serde_json::json;

use super::models::{ApiResponse, ChatAction};

#[derive(Clone, Debug)]
pub struct TelegramClient {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn call<T: Serialize + ?Sized>(&self, method: &str, payload: &T) -> Result<(), Error> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let resp: ApiResponse = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            return Err(anyhow!(
                "Telegram {} failed: {}",
                method,
                resp.description.unwrap_or_default()
            ));
        }
        Ok(())
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), Error> {
        self.call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), Error> {
        self.call(
            "sendChatAction",
            &json!({ "chat_id": chat_id, "action": action }),
        )
        .await
    }

    /// Point Telegram at `{webhook_url}/api/telegram/{token}`.
    pub async fn set_webhook(&self, webhook_url: &str) -> Result<(), Error> {
        let url = format!(
            "{}/api/telegram/{}",
            webhook_url.trim_end_matches('/'),
            self.token
        );
        tracing::info!("Registering Telegram webhook");
        self.call("setWebhook", &json!({ "url": url })).await
    }
}
