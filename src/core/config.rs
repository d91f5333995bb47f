use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub telegram_token: String,
    pub telegram_api_base: String,
    pub webhook_url: Option<String>,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_message: Option<String>,
    pub history_capacity: usize,
    pub history_retention: Duration,
    pub cooldown: Duration,
    pub completion_timeout: Duration,
    pub purge_interval: Duration,
}

/// Read an env var and parse it, falling back to `default` when the
/// var is missing or can't be parsed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(val) => val.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {}", key, val);
            default
        }),
        Err(_) => default,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("RELAY_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/chat_history.db", storage_path.trim_end_matches('/'));
        let telegram_token = env::var("TELEGRAM_TOKEN").unwrap_or_else(|_| {
            tracing::warn!("Missing env var TELEGRAM_TOKEN");
            String::new()
        });
        let telegram_api_base = env::var("RELAY_TELEGRAM_API_BASE")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let webhook_url = env::var("WEBHOOK_URL").ok();
        let openai_api_hostname = env::var("RELAY_LLM_HOST")
            .unwrap_or_else(|_| "https://api.groq.com/openai".to_string());
        let openai_api_key = env::var("GROQ_API_KEY").unwrap_or_default();
        let openai_model =
            env::var("RELAY_LLM_MODEL").unwrap_or_else(|_| "llama3-8b-8192".to_string());
        let system_message = env::var("RELAY_SYSTEM_MESSAGE").ok();

        Self {
            storage_path,
            db_path,
            telegram_token,
            telegram_api_base,
            webhook_url,
            openai_api_hostname,
            openai_api_key,
            openai_model,
            temperature: env_or("RELAY_LLM_TEMPERATURE", 0.7),
            max_tokens: env_or("RELAY_LLM_MAX_TOKENS", 1024),
            system_message,
            history_capacity: env_or("RELAY_HISTORY_CAPACITY", 10),
            history_retention: Duration::from_secs(env_or("RELAY_HISTORY_RETENTION_SECS", 60 * 60)),
            cooldown: Duration::from_millis(env_or("RELAY_COOLDOWN_MS", 3000)),
            completion_timeout: Duration::from_secs(env_or("RELAY_LLM_TIMEOUT_SECS", 60)),
            purge_interval: Duration::from_secs(env_or("RELAY_PURGE_INTERVAL_SECS", 60 * 5)),
        }
    }
}
