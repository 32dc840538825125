use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use narrate::services::llm::LlmService;
use narrate::services::tts::{ElevenLabsTts, OpenAiTts};
use narrate::session::{NoticeLevel, Orchestrator, SessionState};
use narrate::synthesis::Synthesizer;
use narrate::voices::{Provider, VoiceAssignments, VoiceRegistry};
use narrate::AppConfig;

type App = Orchestrator<LlmService, OpenAiTts, ElevenLabsTts>;

/// Turn a story into a multi-voice audiobook.
#[derive(Parser)]
#[command(name = "narrate", version, about, long_about = None)]
struct Cli {
    /// Story text file. Reads stdin when omitted or "-".
    #[arg(long, short)]
    input: Option<PathBuf>,
    /// JSON voice assignments, e.g. {"Narrator": {"provider": "OpenAI", "voice": "onyx"}}.
    /// Prompts per speaker when omitted.
    #[arg(long)]
    voices: Option<PathBuf>,
    /// Directory for per-line audio files.
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
    /// Combined audiobook path (overwritten on every run).
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Also save a copy of the finished download here.
    #[arg(long)]
    download: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("narrate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load();
    if let Some(dir) = cli.artifact_dir.clone() {
        config.artifact_dir = dir;
    }
    if let Some(output) = cli.output.clone() {
        config.output_path = output;
    }

    let reading_stdin = cli.input.as_deref().map_or(true, |p| p.as_os_str() == "-");
    if reading_stdin && cli.voices.is_none() {
        bail!("story text on stdin needs --voices; pass --input FILE to choose voices interactively");
    }

    let mut stdin = BufReader::new(tokio::io::stdin());
    let text = if reading_stdin {
        let mut text = String::new();
        stdin.read_to_string(&mut text).await.context("reading story from stdin")?;
        text
    } else {
        let path = cli.input.as_deref().unwrap_or_else(|| std::path::Path::new("-"));
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    let http = reqwest::Client::new();
    let app: App = Orchestrator::new(
        LlmService::new(http.clone(), &config),
        Synthesizer::new(
            OpenAiTts::new(http.clone(), &config),
            ElevenLabsTts::new(http, &config),
            config.artifact_dir.clone(),
        ),
        config.output_path.clone(),
    );

    let mut state = SessionState::new();
    state.submit_text(text)?;
    let outcome = drive(&app, &mut state, &cli, stdin.lines()).await;
    print_notices(&mut state);
    outcome
}

async fn drive(app: &App, state: &mut SessionState, cli: &Cli, mut input: Lines<BufReader<Stdin>>) -> Result<()> {
    let transcript = app.structure(state).await?;
    print_transcript(transcript);
    if transcript.is_empty() {
        println!("No lines could be parsed from the structured text; nothing to synthesize.");
        return Ok(());
    }

    let mut registry = app.voice_registry(state)?;
    let assignments = match &cli.voices {
        Some(path) => {
            let loaded = VoiceAssignments::load(path)
                .with_context(|| format!("loading voice assignments from {}", path.display()))?;
            apply_assignments(app, &mut registry, &loaded).await?
        }
        None => prompt_assignments(app, &mut registry, &mut input).await?,
    };
    app.assign_voices(state, &assignments)?;

    app.render(state).await?;
    print_notices(state);

    let (delivery, report) = app.deliver(state).await?;
    println!(
        "Audiobook ready: {} ({} bytes, {})",
        delivery.path.display(),
        delivery.len,
        delivery.mime_type
    );
    if let Some(dest) = &cli.download {
        delivery.save_to(dest).await?;
        println!("Saved download to {}", dest.display());
    }
    if !report.is_clean() {
        println!("{} intermediate file(s) could not be deleted", report.failed.len());
    }
    Ok(())
}

/// Runs file-supplied choices through the registry so names resolve to ids
/// and unknown voices are caught before synthesis.
async fn apply_assignments(app: &App, registry: &mut VoiceRegistry, loaded: &VoiceAssignments) -> Result<VoiceAssignments> {
    if loaded.uses(Provider::ElevenLabs) {
        app.load_catalog(registry).await?;
    }
    for speaker in registry.speakers().to_vec() {
        if let Some(choice) = loaded.get(&speaker) {
            registry.select(&speaker, choice.provider, &choice.voice_id)?;
        }
    }
    for (speaker, _) in loaded.iter() {
        if !registry.speakers().contains(speaker) {
            tracing::warn!(%speaker, "assignment for speaker not in transcript ignored");
        }
    }
    Ok(registry.finalize()?)
}

async fn prompt_assignments(
    app: &App,
    registry: &mut VoiceRegistry,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<VoiceAssignments> {
    for speaker in registry.speakers().to_vec() {
        loop {
            println!("Select TTS API for {speaker}: [1] OpenAI  [2] ElevenLabs");
            let answer = read_answer(input).await?;
            let provider = match answer.as_str() {
                "1" => Provider::OpenAi,
                "2" => Provider::ElevenLabs,
                other => match other.parse::<Provider>() {
                    Ok(p) => p,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                },
            };

            if provider == Provider::ElevenLabs && !registry.has_catalog() {
                app.load_catalog(registry).await?;
            }
            let options = registry.options(provider)?;
            println!("Select voice for {speaker}:");
            for (i, option) in options.iter().enumerate() {
                println!("  [{}] {}", i + 1, option.name);
            }
            let answer = read_answer(input).await?;
            let voice = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .map(|o| o.id.clone())
                .unwrap_or(answer);

            match registry.select(&speaker, provider, &voice) {
                Ok(_) => break,
                Err(e) => println!("{e}"),
            }
        }
    }
    Ok(registry.finalize()?)
}

async fn read_answer(input: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    match input.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => bail!("stdin closed before every speaker had a voice"),
    }
}

fn print_transcript(transcript: &narrate::transcript::Transcript) {
    println!("{:<20} {:>6}  Text", "Character", "Chars");
    for record in transcript.records() {
        println!("{:<20} {:>6}  {}", record.speaker, record.char_count, record.text);
    }
}

fn print_notices(state: &mut SessionState) {
    for notice in state.notices.drain() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}
