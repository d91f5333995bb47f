use serde::{Deserialize, Serialize};

// Only the fields the relay reads are modeled, everything else in
// the update is ignored during deserialization.

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramMessage {
    /// The bot command without the leading slash or `@botname`
    /// suffix, e.g. "/start@relay_bot now" -> "start".
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?.trim_start();
        let command = text.strip_prefix('/')?.split_whitespace().next()?;
        Some(command.split('@').next().unwrap_or(command))
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
}

/// Envelope every Bot API method responds with
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: Option<&str>) -> TelegramMessage {
        TelegramMessage {
            message_id: 1,
            chat: Chat { id: 10 },
            text: text.map(String::from),
        }
    }

    #[test]
    fn it_parses_commands() {
        assert_eq!(message(Some("/start")).command(), Some("start"));
        assert_eq!(message(Some("/start@relay_bot now")).command(), Some("start"));
        assert_eq!(message(Some("hello /start")).command(), None);
        assert_eq!(message(None).command(), None);
    }

    #[test]
    fn it_ignores_unknown_update_fields() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 5,
                "message": {
                    "message_id": 9,
                    "date": 1704067200,
                    "from": {"id": 3, "is_bot": false, "first_name": "Sam"},
                    "chat": {"id": 3, "type": "private"},
                    "text": "hi"
                }
            }"#,
        )
        .unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 3);
        assert_eq!(message.text.as_deref(), Some("hi"));
    }
}
