//! Router for the Telegram webhook

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::state::AppState;
use crate::history::ConversationId;
use crate::telegram::{ChatAction, GREETING_MESSAGE, Update};

type SharedState = Arc<RwLock<AppState>>;

/// Handle an update pushed by Telegram. The token in the path must
/// match the bot token so only Telegram can reach the handler.
///
/// Accepted updates always get a 200, otherwise Telegram keeps
/// redelivering them.
async fn telegram_webhook(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    let (service, telegram, expected_token) = {
        let shared_state = state.read().expect("Unable to read share state");
        (
            shared_state.service.clone(),
            shared_state.telegram.clone(),
            shared_state.config.telegram_token.clone(),
        )
    };

    if expected_token.is_empty() || token != expected_token {
        tracing::warn!("Rejected webhook call with unknown token");
        return StatusCode::NOT_FOUND;
    }

    let Some(message) = update.message else {
        return StatusCode::OK;
    };
    let chat_id = message.chat.id;

    let command = message.command().map(str::to_owned);

    let reply = match (command.as_deref(), message.text) {
        (Some("start"), _) => Reply::Text(GREETING_MESSAGE.to_string()),
        (Some(command), _) => {
            tracing::debug!("Ignoring unsupported command /{}", command);
            return StatusCode::OK;
        }
        (None, None) => return StatusCode::OK,
        (None, Some(text)) => {
            // Admitting here rather than in the spawned task keeps
            // back-to-back updates in arrival order
            let conversation_id = ConversationId::from(chat_id);
            match service.admit(&conversation_id) {
                Ok(()) => Reply::Turn(conversation_id, text),
                Err(e) => Reply::Text(e.user_message().to_string()),
            }
        }
    };

    // Answer Telegram right away, the completion can take far longer
    // than it waits before redelivering the update
    tokio::spawn(async move {
        let text = match reply {
            Reply::Text(text) => text,
            Reply::Turn(conversation_id, user_text) => {
                if let Err(e) = telegram.send_chat_action(chat_id, ChatAction::Typing).await {
                    tracing::warn!("Failed to send typing indicator to {}: {}", chat_id, e);
                }
                match service.run_admitted_turn(&conversation_id, &user_text).await {
                    Ok(reply) => reply,
                    Err(e) => e.user_message().to_string(),
                }
            }
        };

        if let Err(e) = telegram.send_message(chat_id, &text).await {
            tracing::error!("Failed to send reply to {}: {}", chat_id, e);
        }
    });

    StatusCode::OK
}

enum Reply {
    Text(String),
    Turn(ConversationId, String),
}

/// Create the Telegram router
pub fn router() -> Router<SharedState> {
    Router::new().route("/{token}", axum::routing::post(telegram_webhook))
}
