//! Clients for the two speech providers.
//!
//! Both write a finished audio file to a caller-chosen path; the synthesis
//! adapter decides the path and checks that the file materialised.

pub mod elevenlabs;
pub mod openai;

pub use elevenlabs::ElevenLabsTts;
pub use openai::OpenAiTts;

use std::future::Future;
use std::path::Path;

use crate::error::Result;
use crate::voices::VoiceOption;

pub trait SpeechBackend {
    /// File extension of the audio this backend writes.
    fn extension(&self) -> &'static str {
        "mp3"
    }

    fn synthesize_to(
        &self,
        text: &str,
        voice_id: &str,
        path: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// A provider whose voices are discovered at runtime.
pub trait VoiceCatalog {
    fn list_voices(&self) -> impl Future<Output = Result<Vec<VoiceOption>>> + Send;
}
