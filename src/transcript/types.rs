use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::voices::{Provider, VoiceAssignments};

/// One parsed `Speaker: utterance` unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceRecord {
    pub speaker: String,
    pub text: String,
    /// Character length of `text` at creation time. Display only.
    pub char_count: usize,
}

impl UtteranceRecord {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            speaker: speaker.into(),
            char_count: text.chars().count(),
            text,
        }
    }
}

/// Ordered records for one session. Order is playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    records: Vec<UtteranceRecord>,
}

impl Transcript {
    pub fn new(records: Vec<UtteranceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[UtteranceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct speaker names in order of first appearance.
    pub fn speakers(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            if !seen.iter().any(|s| s == &record.speaker) {
                seen.push(record.speaker.clone());
            }
        }
        seen
    }

    /// Appends the provider and voice columns. Every speaker must be assigned.
    pub fn assign(&self, assignments: &VoiceAssignments) -> Result<Vec<AssignedLine>> {
        let missing: Vec<String> = self
            .speakers()
            .into_iter()
            .filter(|s| assignments.get(s).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteAssignment { missing });
        }

        Ok(self
            .records
            .iter()
            .filter_map(|record| {
                assignments.get(&record.speaker).map(|choice| AssignedLine {
                    record: record.clone(),
                    provider: choice.provider,
                    voice_id: choice.voice_id.clone(),
                })
            })
            .collect())
    }
}

/// A transcript row after voice assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedLine {
    pub record: UtteranceRecord,
    pub provider: Provider,
    pub voice_id: String,
}
