use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{SpeechBackend, VoiceCatalog};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::voices::VoiceOption;

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Catalog-voice provider.
#[derive(Clone)]
pub struct ElevenLabsTts {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    output_format: String,
}

#[derive(Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceEntry>,
}

#[derive(Deserialize)]
struct VoiceEntry {
    voice_id: String,
    name: String,
}

impl ElevenLabsTts {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            base_url: config.elevenlabs_base_url.trim_end_matches('/').to_string(),
            api_key: config.elevenlabs_api_key.clone(),
            model: config.elevenlabs_model.clone(),
            output_format: config.elevenlabs_output_format.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(Error::MissingCredential { var: "ELEVENLABS_API_KEY" })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Provider { provider: "ElevenLabs", status, body })
    }
}

impl SpeechBackend for ElevenLabsTts {
    async fn synthesize_to(&self, text: &str, voice_id: &str, path: &Path) -> Result<()> {
        // Only MP3 output carries a container the concatenator can decode.
        if !self.output_format.starts_with("mp3_") {
            return Err(Error::UnsupportedOutputFormat(self.output_format.clone()));
        }
        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .query(&[("output_format", self.output_format.as_str())])
            .header(XI_API_KEY_HEADER, self.api_key()?)
            .json(&TextToSpeechBody {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        let audio = Self::check(response).await?.bytes().await?;
        tokio::fs::write(path, &audio).await?;
        debug!(bytes = audio.len(), path = %path.display(), "elevenlabs speech written");
        Ok(())
    }
}

impl VoiceCatalog for ElevenLabsTts {
    async fn list_voices(&self) -> Result<Vec<VoiceOption>> {
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header(XI_API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;

        let listing: VoicesResponse = Self::check(response).await?.json().await?;
        Ok(listing
            .voices
            .into_iter()
            .map(|v| VoiceOption { id: v.voice_id, name: v.name })
            .collect())
    }
}
