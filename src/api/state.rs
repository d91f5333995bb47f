use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::conversation::ConversationService;
use crate::core::AppConfig;
use crate::history::{HistoryPolicy, SqliteHistoryStore};
use crate::limiter::RateLimiter;
use crate::openai::{CompletionOptions, OpenAiCompletion};
use crate::telegram::TelegramClient;

pub struct AppState {
    pub service: Arc<ConversationService>,
    pub telegram: TelegramClient,
    pub config: AppConfig,
}

impl AppState {
    /// Wire up the SQLite history, rate limiter and completion client
    /// described by `config`.
    pub fn new(db: Connection, config: AppConfig) -> Self {
        let AppConfig {
            openai_api_hostname,
            openai_api_key,
            openai_model,
            temperature,
            max_tokens,
            system_message,
            history_capacity,
            history_retention,
            cooldown,
            completion_timeout,
            telegram_api_base,
            telegram_token,
            ..
        } = &config;

        let store = SqliteHistoryStore::new(
            db,
            HistoryPolicy {
                capacity: *history_capacity,
                retention: *history_retention,
            },
        );
        let completion = OpenAiCompletion::new(
            openai_api_hostname,
            openai_api_key,
            CompletionOptions {
                model: openai_model.clone(),
                temperature: *temperature,
                max_tokens: *max_tokens,
                timeout: *completion_timeout,
            },
        )
        .system_message(system_message.clone());
        let service = ConversationService::new(
            Arc::new(store),
            Arc::new(RateLimiter::new(*cooldown)),
            Arc::new(completion),
        )
        .completion_timeout(*completion_timeout);

        Self {
            service: Arc::new(service),
            telegram: TelegramClient::new(telegram_api_base, telegram_token),
            config,
        }
    }
}
