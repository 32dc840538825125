use std::path::PathBuf;
use thiserror::Error;

use crate::session::stage::SessionStage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid provider selection: {0:?} (expected OpenAI or ElevenLabs)")]
    InvalidProvider(String),

    #[error("provider reported success but no audio file exists at {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("audio file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("{var} is not set")]
    MissingCredential { var: &'static str },

    #[error("{provider} returned {status}: {body}")]
    Provider {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unsupported ElevenLabs output format {0:?} (expected mp3_*)")]
    UnsupportedOutputFormat(String),

    #[error("structuring service returned no content")]
    EmptyResponse,

    #[error("transcript has no lines to synthesize")]
    EmptyTranscript,

    #[error("unknown speaker: {0}")]
    UnknownSpeaker(String),

    #[error("voice {voice:?} is not offered by {provider}")]
    UnknownVoice { provider: String, voice: String },

    #[error("voice catalog has not been fetched yet")]
    CatalogNotLoaded,

    #[error("no voice assigned for: {}", .missing.join(", "))]
    IncompleteAssignment { missing: Vec<String> },

    #[error("cannot {action} while session is {stage:?}")]
    InvalidTransition {
        stage: SessionStage,
        action: &'static str,
    },

    #[error("audio decoding failed for {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("audio encoding failed: {0}")]
    Encode(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("cannot mix {from} channel audio into {to} channels")]
    UnsupportedLayout { from: u16, to: u16 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
