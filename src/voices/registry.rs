use std::collections::HashMap;

use super::assignments::VoiceAssignments;
use super::types::{Provider, VoiceChoice, VoiceOption, OPENAI_VOICES};
use crate::error::{Error, Result};

/// Collects one provider + voice selection per speaker.
///
/// Partial selection is a valid intermediate state; only `finalize` hands
/// out something synthesis will accept.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    speakers: Vec<String>,
    selections: HashMap<String, VoiceChoice>,
    catalog: Option<Vec<VoiceOption>>,
}

impl VoiceRegistry {
    /// `speakers` should be in first-appearance order; duplicates are ignored.
    pub fn new(speakers: impl IntoIterator<Item = String>) -> Self {
        let mut ordered: Vec<String> = Vec::new();
        for speaker in speakers {
            if !ordered.contains(&speaker) {
                ordered.push(speaker);
            }
        }
        Self {
            speakers: ordered,
            ..Self::default()
        }
    }

    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    /// Installs the ElevenLabs catalog fetched by the caller.
    pub fn set_catalog(&mut self, voices: Vec<VoiceOption>) {
        self.catalog = Some(voices);
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Voices valid for `provider`.
    pub fn options(&self, provider: Provider) -> Result<Vec<VoiceOption>> {
        match provider {
            Provider::OpenAi => Ok(OPENAI_VOICES.iter().map(|v| VoiceOption::fixed(v)).collect()),
            Provider::ElevenLabs => self.catalog.clone().ok_or(Error::CatalogNotLoaded),
        }
    }

    /// Records a selection. `voice` may be an option id or its display name;
    /// the resolved id is stored.
    pub fn select(&mut self, speaker: &str, provider: Provider, voice: &str) -> Result<&VoiceChoice> {
        if !self.speakers.iter().any(|s| s == speaker) {
            return Err(Error::UnknownSpeaker(speaker.to_string()));
        }

        let voice = voice.trim();
        let option = self
            .options(provider)?
            .into_iter()
            .find(|o| o.id == voice || o.name == voice)
            .ok_or_else(|| Error::UnknownVoice {
                provider: provider.to_string(),
                voice: voice.to_string(),
            })?;

        let choice = VoiceChoice {
            provider,
            voice_id: option.id,
        };
        self.selections.insert(speaker.to_string(), choice);
        Ok(&self.selections[speaker])
    }

    pub fn selection(&self, speaker: &str) -> Option<&VoiceChoice> {
        self.selections.get(speaker)
    }

    /// Speakers still lacking a selection, in registration order.
    pub fn unassigned(&self) -> Vec<String> {
        self.speakers
            .iter()
            .filter(|s| !self.selections.contains_key(*s))
            .cloned()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned().is_empty()
    }

    pub fn finalize(&self) -> Result<VoiceAssignments> {
        let missing = self.unassigned();
        if !missing.is_empty() {
            return Err(Error::IncompleteAssignment { missing });
        }
        let mut assignments = VoiceAssignments::default();
        for speaker in &self.speakers {
            if let Some(choice) = self.selections.get(speaker) {
                assignments.insert(speaker.clone(), choice.clone());
            }
        }
        Ok(assignments)
    }
}
