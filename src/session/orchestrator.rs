use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::delivery::{remove_artifacts, CleanupReport, Delivery};
use super::notice::NoticeLog;
use super::stage::{SessionGraph, SessionStage, StageRequest};
use crate::audio::{concatenate, export};
use crate::error::{Error, Result};
use crate::services::llm::StructuringService;
use crate::services::tts::{SpeechBackend, VoiceCatalog};
use crate::synthesis::Synthesizer;
use crate::transcript::{parse_transcript, AssignedLine, Transcript};
use crate::voices::{VoiceAssignments, VoiceRegistry};

/// Everything one session holds between operator steps.
///
/// Mutated only through `Orchestrator`; a new text submission wipes it.
#[derive(Debug, Default)]
pub struct SessionState {
    pub id: Uuid,
    stage: SessionStage,
    text: Option<String>,
    transcript: Option<Transcript>,
    lines: Vec<AssignedLine>,
    artifacts: Vec<PathBuf>,
    output: Option<PathBuf>,
    pub notices: NoticeLog,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            ..Self::default()
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Transcript rows with the provider and voice columns filled in.
    pub fn assigned_lines(&self) -> &[AssignedLine] {
        &self.lines
    }

    /// Per-line artifacts currently on disk.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Starts over with new text, discarding transcript and assignments.
    pub fn submit_text(&mut self, text: impl Into<String>) -> Result<()> {
        let mut fresh = Self {
            stage: self.stage,
            text: Some(text.into()),
            ..Self::new()
        };
        fresh.advance(StageRequest::SubmitText)?;
        *self = fresh;
        Ok(())
    }

    /// The ONLY way the stage changes.
    fn advance(&mut self, request: StageRequest) -> Result<()> {
        match SessionGraph::transition(self.stage, request) {
            Some(next) => {
                info!(session = %self.id, from = ?self.stage, to = ?next, "stage transition");
                self.stage = next;
                Ok(())
            }
            None => Err(Error::InvalidTransition {
                stage: self.stage,
                action: request.action(),
            }),
        }
    }

    fn abort(&mut self, err: &Error) {
        error!(session = %self.id, stage = ?self.stage, error = %err, "session aborted");
        self.notices.error(err.to_string());
        if let Err(refused) = self.advance(StageRequest::Abort) {
            warn!(session = %self.id, error = %refused, "abort refused");
        }
    }
}

/// Drives a session through structuring, voice assignment, synthesis,
/// concatenation and delivery, one blocking step at a time.
pub struct Orchestrator<L, A, B> {
    structurer: L,
    synthesizer: Synthesizer<A, B>,
    output_path: PathBuf,
}

impl<L, A, B> Orchestrator<L, A, B>
where
    L: StructuringService,
    A: SpeechBackend + Sync,
    B: SpeechBackend + Sync,
{
    pub fn new(structurer: L, synthesizer: Synthesizer<A, B>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            structurer,
            synthesizer,
            output_path: output_path.into(),
        }
    }

    /// One structuring call, then lenient parsing.
    pub async fn structure<'s>(&self, state: &'s mut SessionState) -> Result<&'s Transcript> {
        let Some(text) = state.text.clone() else {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::Structure.action(),
            });
        };
        if state.stage != SessionStage::TextEntered {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::Structure.action(),
            });
        }

        let span = info_span!("session", id = %state.id);
        let structured = match self.structurer.structure(&text).instrument(span).await {
            Ok(structured) => structured,
            Err(e) => {
                state.abort(&e);
                return Err(e);
            }
        };

        let transcript = parse_transcript(&structured);
        info!(session = %state.id, lines = transcript.len(), speakers = transcript.speakers().len(), "transcript parsed");
        state.advance(StageRequest::Structure)?;
        Ok(state.transcript.insert(transcript))
    }

    /// A registry seeded with the transcript's speakers.
    pub fn voice_registry(&self, state: &SessionState) -> Result<VoiceRegistry> {
        match (&state.transcript, state.stage) {
            (Some(transcript), SessionStage::Structured) => Ok(VoiceRegistry::new(transcript.speakers())),
            _ => Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::AssignVoices.action(),
            }),
        }
    }

    pub fn assign_voices(&self, state: &mut SessionState, assignments: &VoiceAssignments) -> Result<()> {
        let Some(transcript) = state.transcript.as_ref() else {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::AssignVoices.action(),
            });
        };
        if state.stage != SessionStage::Structured {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::AssignVoices.action(),
            });
        }
        let lines = transcript.assign(assignments)?;
        state.advance(StageRequest::AssignVoices)?;
        state.lines = lines;
        Ok(())
    }

    /// Synthesizes every line in order, concatenates, and exports the
    /// combined file over any previous output.
    ///
    /// The first failure aborts the session. Artifacts already written stay
    /// on disk and no combined output is produced.
    pub async fn render(&self, state: &mut SessionState) -> Result<PathBuf> {
        if state.stage == SessionStage::VoicesAssigned && state.lines.is_empty() {
            return Err(Error::EmptyTranscript);
        }
        state.advance(StageRequest::BeginSynthesis)?;

        let span = info_span!("session", id = %state.id);
        let result = self.render_lines(state).instrument(span).await;
        match result {
            Ok(path) => {
                state.advance(StageRequest::FinishConcatenation)?;
                state.output = Some(path.clone());
                Ok(path)
            }
            Err(e) => {
                state.abort(&e);
                Err(e)
            }
        }
    }

    async fn render_lines(&self, state: &mut SessionState) -> Result<PathBuf> {
        let total = state.lines.len();
        for (index, line) in state.lines.iter().enumerate() {
            let path = self
                .synthesizer
                .synthesize(&line.record.text, &line.voice_id, line.provider)
                .await?;
            info!(line = index + 1, total, speaker = %line.record.speaker, "line synthesized");
            state.notices.info(format!("Generated audio file: {}", path.display()));
            state.artifacts.push(path);
        }

        let combined = concatenate(&state.artifacts)?;
        export(&combined, &self.output_path)?;
        Ok(self.output_path.clone())
    }

    /// Hands out the combined file, then deletes every intermediate
    /// artifact. Deletion failures are reported, never raised.
    pub async fn deliver(&self, state: &mut SessionState) -> Result<(Delivery, CleanupReport)> {
        let Some(output) = state.output.clone() else {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::Deliver.action(),
            });
        };
        if state.stage != SessionStage::Concatenated {
            return Err(Error::InvalidTransition {
                stage: state.stage,
                action: StageRequest::Deliver.action(),
            });
        }

        let delivery = Delivery::open(&output).await?;
        state.advance(StageRequest::Deliver)?;

        let report = remove_artifacts(&state.artifacts).await;
        for path in &report.deleted {
            state.notices.info(format!("Deleted file: {}", path.display()));
        }
        for (path, e) in &report.failed {
            state.notices.error(format!("Error deleting file {}: {}", path.display(), e));
        }
        state.artifacts.retain(|p| report.failed.iter().any(|(f, _)| f == p));
        info!(session = %state.id, deleted = report.deleted.len(), failed = report.failed.len(), "cleanup finished");
        Ok((delivery, report))
    }

    /// Non-interactive run: text in, delivered audiobook out.
    pub async fn run(
        &self,
        state: &mut SessionState,
        text: impl Into<String>,
        assignments: &VoiceAssignments,
    ) -> Result<(Delivery, CleanupReport)> {
        state.submit_text(text)?;
        self.structure(state).await?;
        self.assign_voices(state, assignments)?;
        self.render(state).await?;
        self.deliver(state).await
    }
}

impl<L, A, B> Orchestrator<L, A, B>
where
    L: StructuringService,
    A: SpeechBackend + Sync,
    B: SpeechBackend + VoiceCatalog + Sync,
{
    /// Fetches the ElevenLabs catalog into `registry`.
    pub async fn load_catalog(&self, registry: &mut VoiceRegistry) -> Result<()> {
        let voices = self.synthesizer.elevenlabs().list_voices().await?;
        info!(voices = voices.len(), "voice catalog fetched");
        registry.set_catalog(voices);
        Ok(())
    }
}
