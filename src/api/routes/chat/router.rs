//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use super::public;
use crate::api::state::AppState;
use crate::conversation::TurnError;
use crate::history::ConversationId;

type SharedState = Arc<RwLock<AppState>>;

fn turn_error_status(err: &TurnError) -> StatusCode {
    match err {
        TurnError::Throttled => StatusCode::TOO_MANY_REQUESTS,
        TurnError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TurnError::CompletionFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Run one turn of a conversation and respond with the reply
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<public::ChatRequest>,
) -> Response {
    let service = state.read().expect("Unable to read share state").service.clone();

    match service
        .handle_turn(&payload.conversation_id, &payload.message)
        .await
    {
        Ok(reply) => Json(public::ChatResponse { reply }).into_response(),
        Err(e) => (
            turn_error_status(&e),
            Json(public::ChatErrorResponse {
                error: e.user_message().to_string(),
            }),
        )
            .into_response(),
    }
}

/// Get the retained history of a conversation
async fn chat_transcript(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::ChatTranscriptResponse>, crate::api::public::ApiError> {
    let service = state.read().expect("Unable to read share state").service.clone();
    let transcript = service.history(&ConversationId::new(id)).await?;

    Ok(Json(public::ChatTranscriptResponse { transcript }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/{id}", get(chat_transcript))
}
