mod common;

use common::{CannedStructurer, FailingStructurer, FlakyBackend, ToneBackend, TONE_RATE};
use futures_util::StreamExt;
use narrate::audio::decode_file;
use narrate::session::{NoticeLevel, Orchestrator, SessionStage, SessionState};
use narrate::synthesis::Synthesizer;
use narrate::voices::{Provider, VoiceAssignments, VoiceChoice};
use narrate::Error;
use std::path::Path;

const STORY: &str = "Narrator: It was dark.\nDetective: Who did this?";

fn assignments() -> VoiceAssignments {
    let mut a = VoiceAssignments::default();
    a.insert("Narrator".into(), VoiceChoice { provider: Provider::OpenAi, voice_id: "onyx".into() });
    a.insert("Detective".into(), VoiceChoice { provider: Provider::ElevenLabs, voice_id: "id-josh".into() });
    a
}

fn orchestrator(dir: &Path, reply: &str) -> Orchestrator<CannedStructurer, ToneBackend, ToneBackend> {
    Orchestrator::new(
        CannedStructurer::new(reply),
        Synthesizer::new(ToneBackend::new(400), ToneBackend::new(600), dir.join("artifacts")),
        dir.join("final_audiobook.wav"),
    )
}

#[tokio::test]
async fn test_two_lines_render_to_summed_duration() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("artifacts")).unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();

    state.submit_text("raw story text").unwrap();
    let transcript = app.structure(&mut state).await.unwrap();
    assert_eq!(transcript.len(), 2);
    app.assign_voices(&mut state, &assignments()).unwrap();
    assert_eq!(state.stage(), SessionStage::VoicesAssigned);

    let output = app.render(&mut state).await.unwrap();
    assert_eq!(state.stage(), SessionStage::Concatenated);
    assert_eq!(state.artifacts().len(), 2);

    let durations: f64 = state
        .artifacts()
        .iter()
        .map(|p| decode_file(p).unwrap().duration().as_secs_f64())
        .sum();
    let combined = decode_file(&output).unwrap();
    assert_eq!(combined.sample_rate, TONE_RATE);
    assert!((combined.duration().as_secs_f64() - durations).abs() < 0.01);
    assert!((durations - 1.0).abs() < 0.01);
}

#[tokio::test]
async fn test_delivery_removes_intermediates_and_keeps_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("artifacts")).unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();

    let (delivery, report) = app.run(&mut state, "raw story text", &assignments()).await.unwrap();

    assert_eq!(state.stage(), SessionStage::Delivered);
    assert!(report.is_clean());
    assert_eq!(report.deleted.len(), 2);
    for path in &report.deleted {
        assert!(!path.exists(), "{} should be deleted", path.display());
    }
    assert!(state.artifacts().is_empty());
    assert!(delivery.path.is_file());
    assert_eq!(delivery.file_name, "final_audiobook.wav");

    let mut streamed = Vec::new();
    let mut stream = delivery.stream().await.unwrap();
    while let Some(chunk) = stream.next().await {
        streamed.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(streamed.len() as u64, delivery.len);
    assert_eq!(streamed, delivery.bytes().await.unwrap());

    let copy = dir.path().join("download.wav");
    assert_eq!(delivery.save_to(&copy).await.unwrap(), delivery.len);

    let messages: Vec<String> = state.notices.iter().map(|n| n.message.clone()).collect();
    assert_eq!(messages.iter().filter(|m| m.starts_with("Generated audio file: ")).count(), 2);
    assert_eq!(messages.iter().filter(|m| m.starts_with("Deleted file: ")).count(), 2);
}

#[tokio::test]
async fn test_mp3_output_is_offered_as_audio_mp3() {
    let dir = tempfile::tempdir().unwrap();
    let app = Orchestrator::new(
        CannedStructurer::new(STORY),
        Synthesizer::new(ToneBackend::new(300), ToneBackend::new(300), dir.path()),
        dir.path().join("final_audiobook.mp3"),
    );
    let mut state = SessionState::new();

    let (delivery, _) = app.run(&mut state, "story", &assignments()).await.unwrap();

    assert_eq!(delivery.mime_type, "audio/mp3");
    assert!(delivery.len > 0);
}

#[tokio::test]
async fn test_lines_are_synthesized_in_transcript_order() {
    let dir = tempfile::tempdir().unwrap();
    let reply = "Narrator: one\nDetective: two\nNarrator: three\nDetective: four";
    let app = Orchestrator::new(
        CannedStructurer::new(reply),
        Synthesizer::new(ToneBackend::new(50), ToneBackend::new(50), dir.path()),
        dir.path().join("out.wav"),
    );
    let mut state = SessionState::new();
    let mut a = VoiceAssignments::default();
    a.insert("Narrator".into(), VoiceChoice { provider: Provider::OpenAi, voice_id: "onyx".into() });
    a.insert("Detective".into(), VoiceChoice { provider: Provider::OpenAi, voice_id: "echo".into() });

    app.run(&mut state, "story", &a).await.unwrap();

    let lines: Vec<&str> = state.assigned_lines().iter().map(|l| l.record.text.as_str()).collect();
    assert_eq!(lines, ["one", "two", "three", "four"]);
}

#[tokio::test]
async fn test_failure_mid_synthesis_aborts_and_leaves_earlier_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let reply = "Narrator: one\nNarrator: two\nNarrator: three";
    let output = dir.path().join("final.wav");
    let app = Orchestrator::new(
        CannedStructurer::new(reply),
        Synthesizer::new(FlakyBackend::new(2), ToneBackend::new(50), dir.path()),
        output.clone(),
    );
    let mut a = VoiceAssignments::default();
    a.insert("Narrator".into(), VoiceChoice { provider: Provider::OpenAi, voice_id: "onyx".into() });
    let mut state = SessionState::new();

    let err = app.run(&mut state, "story", &a).await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }));
    assert_eq!(state.stage(), SessionStage::Aborted);
    assert_eq!(state.artifacts().len(), 2);
    assert!(state.artifacts().iter().all(|p| p.exists()));
    assert!(!output.exists());
    assert!(state.notices.errors().count() >= 1);

    let again = app.deliver(&mut state).await.unwrap_err();
    assert!(matches!(again, Error::InvalidTransition { stage: SessionStage::Aborted, .. }));
}

#[tokio::test]
async fn test_cleanup_failure_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), STORY);
    std::fs::create_dir(dir.path().join("artifacts")).unwrap();
    let mut state = SessionState::new();
    state.submit_text("story").unwrap();
    app.structure(&mut state).await.unwrap();
    app.assign_voices(&mut state, &assignments()).unwrap();
    app.render(&mut state).await.unwrap();

    let vanished = state.artifacts()[0].clone();
    std::fs::remove_file(&vanished).unwrap();

    let (delivery, report) = app.deliver(&mut state).await.unwrap();

    assert_eq!(state.stage(), SessionStage::Delivered);
    assert!(delivery.path.exists());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, vanished);
    assert_eq!(report.deleted.len(), 1);
    assert!(state
        .notices
        .iter()
        .any(|n| n.level == NoticeLevel::Error && n.message.starts_with("Error deleting file")));
}

#[tokio::test]
async fn test_steps_out_of_order_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();

    assert!(matches!(
        app.structure(&mut state).await,
        Err(Error::InvalidTransition { stage: SessionStage::Idle, .. })
    ));

    state.submit_text("story").unwrap();
    assert!(matches!(
        app.render(&mut state).await,
        Err(Error::InvalidTransition { stage: SessionStage::TextEntered, .. })
    ));

    app.structure(&mut state).await.unwrap();
    assert!(matches!(
        app.structure(&mut state).await,
        Err(Error::InvalidTransition { stage: SessionStage::Structured, .. })
    ));
}

#[tokio::test]
async fn test_resubmission_discards_previous_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();
    state.submit_text("first story").unwrap();
    app.structure(&mut state).await.unwrap();
    app.assign_voices(&mut state, &assignments()).unwrap();
    let first_id = state.id;

    state.submit_text("second story").unwrap();

    assert_eq!(state.stage(), SessionStage::TextEntered);
    assert_eq!(state.text(), Some("second story"));
    assert!(state.transcript().is_none());
    assert!(state.assigned_lines().is_empty());
    assert_ne!(state.id, first_id);
}

#[tokio::test]
async fn test_incomplete_assignment_keeps_session_structured() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();
    state.submit_text("story").unwrap();
    app.structure(&mut state).await.unwrap();

    let mut partial = VoiceAssignments::default();
    partial.insert("Narrator".into(), VoiceChoice { provider: Provider::OpenAi, voice_id: "onyx".into() });

    assert!(matches!(
        app.assign_voices(&mut state, &partial),
        Err(Error::IncompleteAssignment { .. })
    ));
    assert_eq!(state.stage(), SessionStage::Structured);
}

#[tokio::test]
async fn test_empty_structuring_reply_has_nothing_to_render() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), "I'm sorry, I can't help with that.");
    let mut state = SessionState::new();
    state.submit_text("story").unwrap();

    let transcript = app.structure(&mut state).await.unwrap();
    assert!(transcript.is_empty());

    app.assign_voices(&mut state, &VoiceAssignments::default()).unwrap();
    assert!(matches!(app.render(&mut state).await, Err(Error::EmptyTranscript)));
    assert_eq!(state.stage(), SessionStage::VoicesAssigned);
}

#[tokio::test]
async fn test_structuring_failure_aborts_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = Orchestrator::new(
        FailingStructurer,
        Synthesizer::new(ToneBackend::new(10), ToneBackend::new(10), dir.path()),
        dir.path().join("out.wav"),
    );
    let mut state = SessionState::new();
    state.submit_text("story").unwrap();

    let err = app.structure(&mut state).await.unwrap_err();

    assert!(matches!(err, Error::MissingCredential { var: "OPENAI_API_KEY" }));
    assert_eq!(state.stage(), SessionStage::Aborted);
    assert_eq!(state.notices.errors().count(), 1);

    state.submit_text("another story").unwrap();
    assert_eq!(state.stage(), SessionStage::TextEntered);
    assert_eq!(state.text(), Some("another story"));
}

#[tokio::test]
async fn test_catalog_feeds_registry() {
    let dir = tempfile::tempdir().unwrap();
    let app = orchestrator(dir.path(), STORY);
    let mut state = SessionState::new();
    state.submit_text("story").unwrap();
    app.structure(&mut state).await.unwrap();

    let mut registry = app.voice_registry(&state).unwrap();
    assert_eq!(registry.speakers(), ["Narrator", "Detective"]);
    app.load_catalog(&mut registry).await.unwrap();
    registry.select("Narrator", Provider::OpenAi, "fable").unwrap();
    registry.select("Detective", Provider::ElevenLabs, "Rachel").unwrap();

    let assignments = registry.finalize().unwrap();
    assert_eq!(assignments.get("Detective").unwrap().voice_id, "21m00Tcm4TlvDq8ikWAM");
    app.assign_voices(&mut state, &assignments).unwrap();
}
