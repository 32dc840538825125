use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::services::tts::SpeechBackend;
use crate::voices::Provider;

/// Produces one audio artifact per call, routed to the selected provider.
pub struct Synthesizer<A, B> {
    openai: A,
    elevenlabs: B,
    artifact_dir: PathBuf,
    last_stamp_micros: AtomicI64,
}

impl<A, B> Synthesizer<A, B>
where
    A: SpeechBackend + Sync,
    B: SpeechBackend + Sync,
{
    pub fn new(openai: A, elevenlabs: B, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            openai,
            elevenlabs,
            artifact_dir: artifact_dir.into(),
            last_stamp_micros: AtomicI64::new(i64::MIN),
        }
    }

    pub fn elevenlabs(&self) -> &B {
        &self.elevenlabs
    }

    /// Writes `text` spoken by `voice_id` to a fresh file and returns its path.
    ///
    /// Provider errors propagate unchanged. A call that reports success
    /// without leaving a file behind fails with `MissingArtifact`.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str, voice_id: &str, provider: Provider) -> Result<PathBuf> {
        let stamp = self.next_stamp();
        let path = match provider {
            Provider::OpenAi => {
                let path = self.artifact_path(voice_id, provider, stamp, self.openai.extension());
                self.openai.synthesize_to(text, voice_id, &path).await?;
                path
            }
            Provider::ElevenLabs => {
                let path = self.artifact_path(voice_id, provider, stamp, self.elevenlabs.extension());
                self.elevenlabs.synthesize_to(text, voice_id, &path).await?;
                path
            }
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::MissingArtifact(path));
        }
        info!(path = %path.display(), "artifact written");
        Ok(path)
    }

    fn artifact_path(&self, voice_id: &str, provider: Provider, stamp: DateTime<Local>, ext: &str) -> PathBuf {
        self.artifact_dir
            .join(artifact_file_name(voice_id, provider, stamp, ext))
    }

    /// Wall-clock microsecond stamp, bumped so no two calls share one.
    fn next_stamp(&self) -> DateTime<Local> {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .last_stamp_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        let stamp = now.max(previous.saturating_add(1));
        DateTime::<Utc>::from_timestamp_micros(stamp)
            .unwrap_or_else(Utc::now)
            .with_timezone(&Local)
    }
}

/// `{voice}_{provider}_{YYYYmmddHHMMSSffffff}.{ext}`, with anything outside
/// `[A-Za-z0-9-]` in the voice replaced by `_`.
pub fn artifact_file_name(voice_id: &str, provider: Provider, stamp: DateTime<Local>, ext: &str) -> String {
    let voice: String = voice_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}_{}.{}", voice, provider.as_str(), stamp.format("%Y%m%d%H%M%S%6f"), ext)
}
