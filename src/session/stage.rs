use serde::{Deserialize, Serialize};

/// Lifecycle of one audiobook session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStage {
    Idle,
    /// Raw story text supplied.
    TextEntered,
    /// Structuring reply parsed into a transcript.
    Structured,
    /// Every speaker has a provider and voice.
    VoicesAssigned,
    /// Per-line synthesis in progress.
    Synthesizing,
    /// Combined file exported.
    Concatenated,
    /// Combined file handed out, intermediates removed.
    Delivered,
    /// A step failed. Only a new text submission leaves this stage.
    Aborted,
}

impl Default for SessionStage {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRequest {
    SubmitText,
    Structure,
    AssignVoices,
    BeginSynthesis,
    FinishConcatenation,
    Deliver,
    Abort,
}

impl StageRequest {
    pub fn action(&self) -> &'static str {
        match self {
            StageRequest::SubmitText => "submit text",
            StageRequest::Structure => "structure text",
            StageRequest::AssignVoices => "assign voices",
            StageRequest::BeginSynthesis => "synthesize",
            StageRequest::FinishConcatenation => "concatenate",
            StageRequest::Deliver => "deliver",
            StageRequest::Abort => "abort",
        }
    }
}

/// The session state machine. Forward-only; a text submission restarts it.
pub struct SessionGraph;

impl SessionGraph {
    /// Pure function: (current stage, request) -> next stage.
    /// Returns None if the request is not valid from `current`.
    pub fn transition(current: SessionStage, request: StageRequest) -> Option<SessionStage> {
        use SessionStage::*;
        use StageRequest::*;

        match (current, request) {
            (_, SubmitText) => Some(TextEntered),

            (TextEntered, Structure) => Some(Structured),
            (Structured, AssignVoices) => Some(VoicesAssigned),
            (VoicesAssigned, BeginSynthesis) => Some(Synthesizing),
            (Synthesizing, FinishConcatenation) => Some(Concatenated),
            (Concatenated, Deliver) => Some(Delivered),

            (Idle | Delivered | Aborted, Abort) => None,
            (_, Abort) => Some(Aborted),

            _ => None,
        }
    }
}
