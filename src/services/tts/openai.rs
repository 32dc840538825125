use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::SpeechBackend;
use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Fixed-voice provider. The reply body is streamed straight to disk.
#[derive(Clone)]
pub struct OpenAiTts {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

impl OpenAiTts {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_tts_model.clone(),
        }
    }
}

impl SpeechBackend for OpenAiTts {
    async fn synthesize_to(&self, text: &str, voice_id: &str, path: &Path) -> Result<()> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential { var: "OPENAI_API_KEY" })?;

        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice_id,
            speed: 1.0,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: "OpenAI", status, body });
        }

        match stream_to_file(response, path).await {
            Ok(written) => {
                debug!(bytes = written, path = %path.display(), "openai speech written");
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(path).await {
                    warn!(path = %path.display(), error = %cleanup, "partial speech file left behind");
                }
                Err(e)
            }
        }
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<usize> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(written)
}
