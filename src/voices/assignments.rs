use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::types::{Provider, VoiceChoice};
use crate::error::Result;

/// Finalized speaker -> voice mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceAssignments {
    choices: HashMap<String, VoiceChoice>,
}

#[derive(Deserialize)]
struct RawChoice {
    provider: String,
    voice: String,
}

impl VoiceAssignments {
    pub fn insert(&mut self, speaker: String, choice: VoiceChoice) {
        self.choices.insert(speaker, choice);
    }

    pub fn get(&self, speaker: &str) -> Option<&VoiceChoice> {
        self.choices.get(speaker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VoiceChoice)> {
        self.choices.iter()
    }

    pub fn uses(&self, provider: Provider) -> bool {
        self.choices.values().any(|c| c.provider == provider)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Parses `{"Speaker": {"provider": "OpenAI", "voice": "onyx"}}`.
    ///
    /// Provider names go through `Provider::from_str`, so anything other
    /// than the two known providers fails with `InvalidProvider`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, RawChoice> = serde_json::from_str(json)?;
        let mut assignments = Self::default();
        for (speaker, choice) in raw {
            let provider: Provider = choice.provider.parse()?;
            assignments.insert(
                speaker,
                VoiceChoice {
                    provider,
                    voice_id: choice.voice,
                },
            );
        }
        Ok(assignments)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
