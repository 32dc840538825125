use std::path::PathBuf;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_OUTPUT_FILE: &str = "final_audiobook.mp3";

/// Process-wide settings. Credentials stay optional here: a missing key only
/// fails when the client that needs it makes its first call.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub openai_base_url: String,
    pub elevenlabs_base_url: String,
    pub llm: LlmConfig,
    pub openai_tts_model: String,
    pub elevenlabs_model: String,
    pub elevenlabs_output_format: String,
    pub artifact_dir: PathBuf,
    pub output_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 1000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            elevenlabs_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            elevenlabs_base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            llm: LlmConfig::default(),
            openai_tts_model: "tts-1-hd".to_string(),
            elevenlabs_model: "eleven_monolingual_v1".to_string(),
            elevenlabs_output_format: "mp3_44100_128".to_string(),
            artifact_dir: PathBuf::from("."),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl AppConfig {
    /// `from_env` after loading `.env` from the working directory, if present.
    /// Variables already in the environment are not overridden.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env()
    }

    /// Reads the environment, falling back to defaults for anything unset.
    ///
    /// - OPENAI_API_KEY, ELEVENLABS_API_KEY (optional, checked lazily)
    /// - OPENAI_BASE_URL, ELEVENLABS_BASE_URL
    /// - NARRATE_LLM_MODEL (default "gpt-4"), NARRATE_LLM_MAX_TOKENS (default 1000)
    /// - NARRATE_OPENAI_TTS_MODEL (default "tts-1-hd")
    /// - NARRATE_ELEVENLABS_MODEL (default "eleven_monolingual_v1")
    /// - NARRATE_ELEVENLABS_FORMAT (default "mp3_44100_128")
    /// - NARRATE_ARTIFACT_DIR (default "."), NARRATE_OUTPUT (default "final_audiobook.mp3")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_opt("OPENAI_API_KEY"),
            elevenlabs_api_key: env_opt("ELEVENLABS_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", defaults.openai_base_url),
            elevenlabs_base_url: env_or("ELEVENLABS_BASE_URL", defaults.elevenlabs_base_url),
            llm: LlmConfig {
                model: env_or("NARRATE_LLM_MODEL", defaults.llm.model),
                max_tokens: env_opt("NARRATE_LLM_MAX_TOKENS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.llm.max_tokens),
            },
            openai_tts_model: env_or("NARRATE_OPENAI_TTS_MODEL", defaults.openai_tts_model),
            elevenlabs_model: env_or("NARRATE_ELEVENLABS_MODEL", defaults.elevenlabs_model),
            elevenlabs_output_format: env_or(
                "NARRATE_ELEVENLABS_FORMAT",
                defaults.elevenlabs_output_format,
            ),
            artifact_dir: env_opt("NARRATE_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            output_path: env_opt("NARRATE_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: String) -> String {
    env_opt(key).unwrap_or(default)
}
