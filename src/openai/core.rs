use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::conversation::Completion;
use crate::history::{self, MessageRecord};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl From<history::Role> for Role {
    fn from(role: history::Role) -> Self {
        match role {
            history::Role::User => Role::User,
            history::Role::Assistant => Role::Assistant,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

impl From<&MessageRecord> for Message {
    fn from(record: &MessageRecord) -> Self {
        Message::new(record.role.into(), &record.content)
    }
}

#[derive(Clone, Debug)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: String::from("llama3-8b-8192"),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

pub async fn completion(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    options: &CompletionOptions,
) -> Result<Value, Error> {
    let payload = json!({
        "model": options.model,
        "messages": messages,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(options.timeout)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response)
}

/// Pull the generated text out of a chat completion response.
pub fn completion_content(resp: &Value) -> Result<String, Error> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or(anyhow!("No message received. Resp:\n\n {}", resp))
}

/// Completion collaborator backed by any OpenAI compatible chat
/// completion API (Groq by default).
#[derive(Clone, Debug)]
pub struct OpenAiCompletion {
    api_hostname: String,
    api_key: String,
    options: CompletionOptions,
    system_message: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(api_hostname: &str, api_key: &str, options: CompletionOptions) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            options,
            system_message: None,
        }
    }

    pub fn system_message(mut self, system_message: Option<String>) -> Self {
        self.system_message = system_message;
        self
    }

    fn messages(&self, context: &[MessageRecord]) -> Vec<Message> {
        self.system_message
            .iter()
            .map(|msg| Message::new(Role::System, msg))
            .chain(context.iter().map(Message::from))
            .collect()
    }
}

#[async_trait]
impl Completion for OpenAiCompletion {
    async fn complete(&self, context: &[MessageRecord]) -> Result<String, Error> {
        let messages = self.messages(context);
        let resp = completion(&messages, &self.api_hostname, &self.api_key, &self.options).await?;
        completion_content(&resp)
    }
}
