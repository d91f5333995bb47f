//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::history::{ConversationId, MessageRecord};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub conversation_id: ConversationId,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatTranscriptResponse {
    pub transcript: Vec<MessageRecord>,
}
