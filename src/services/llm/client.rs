use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info};

use crate::config::{AppConfig, LlmConfig};
use crate::error::{Error, Result};

pub const STRUCTURING_PROMPT: &str = "Rewrite the following story as a script. \
Put every line of dialogue or narration on its own line, starting with the \
speaking character's name, or 'Narrator' for narration, followed by a colon \
and a space. For example:\n\
Narrator: It was a dark and stormy night.\n\
Detective: Does anyone see the missing weapon?\n\
Narrator: His question hung in the air, met with silence from the team.";

/// Restructures free text into `Speaker: line` form.
pub trait StructuringService {
    fn structure(&self, text: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Clone)]
pub struct LlmService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl LlmService {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            config: config.llm.clone(),
        }
    }
}

impl StructuringService for LlmService {
    async fn structure(&self, text: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential { var: "OPENAI_API_KEY" })?;

        let request_body = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![
                ChatMessage { role: "system", content: STRUCTURING_PROMPT },
                ChatMessage { role: "user", content: text },
            ],
        };

        info!(model = %self.config.model, chars = text.len(), "requesting transcript structure");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: "OpenAI", status, body });
        }

        let resp_json: ChatResponse = response.json().await?;
        let content = resp_json
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(Error::EmptyResponse)?;
        debug!(lines = content.lines().count(), "structuring reply received");
        Ok(content.trim().to_string())
    }
}
