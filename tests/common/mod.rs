#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use narrate::error::{Error, Result};
use narrate::services::llm::StructuringService;
use narrate::services::tts::{SpeechBackend, VoiceCatalog};
use narrate::voices::VoiceOption;

pub const TONE_RATE: u32 = 24_000;

/// Writes a 16-bit sine tone WAV.
pub fn write_tone(path: &Path, sample_rate: u32, channels: u16, millis: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = sample_rate as u64 * millis as u64 / 1000;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let s = ((t * 440.0 * std::f32::consts::TAU).sin() * 0.3 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
}

pub struct CannedStructurer {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl CannedStructurer {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: AtomicUsize::new(0) }
    }
}

impl StructuringService for CannedStructurer {
    async fn structure(&self, _text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub struct FailingStructurer;

impl StructuringService for FailingStructurer {
    async fn structure(&self, _text: &str) -> Result<String> {
        Err(Error::MissingCredential { var: "OPENAI_API_KEY" })
    }
}

/// Writes a fixed-length WAV tone per call and remembers what it was asked.
pub struct ToneBackend {
    pub millis: u32,
    pub sample_rate: u32,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl ToneBackend {
    pub fn new(millis: u32) -> Self {
        Self::with_rate(millis, TONE_RATE)
    }

    pub fn with_rate(millis: u32, sample_rate: u32) -> Self {
        Self { millis, sample_rate, requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl SpeechBackend for ToneBackend {
    fn extension(&self) -> &'static str {
        "wav"
    }

    async fn synthesize_to(&self, text: &str, voice_id: &str, path: &Path) -> Result<()> {
        self.requests.lock().unwrap().push((text.to_string(), voice_id.to_string()));
        write_tone(path, self.sample_rate, 1, self.millis);
        Ok(())
    }
}

impl VoiceCatalog for ToneBackend {
    async fn list_voices(&self) -> Result<Vec<VoiceOption>> {
        Ok(vec![
            VoiceOption { id: "21m00Tcm4TlvDq8ikWAM".into(), name: "Rachel".into() },
            VoiceOption { id: "TxGEqnHWrfWFTfGW9XjX".into(), name: "Josh".into() },
        ])
    }
}

/// Reports success without writing anything.
pub struct GhostBackend;

impl SpeechBackend for GhostBackend {
    async fn synthesize_to(&self, _text: &str, _voice_id: &str, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Succeeds for the first `ok_calls` calls, then returns a provider error.
pub struct FlakyBackend {
    pub inner: ToneBackend,
    pub ok_calls: usize,
    pub calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(ok_calls: usize) -> Self {
        Self { inner: ToneBackend::new(200), ok_calls, calls: AtomicUsize::new(0) }
    }
}

impl SpeechBackend for FlakyBackend {
    fn extension(&self) -> &'static str {
        "wav"
    }

    async fn synthesize_to(&self, text: &str, voice_id: &str, path: &Path) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.ok_calls {
            return Err(Error::Provider {
                provider: "OpenAI",
                status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                body: "rate limited".to_string(),
            });
        }
        self.inner.synthesize_to(text, voice_id, path).await
    }
}

/// One request as seen by `serve_once`.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Canned HTTP/1.1 reply. `declared_len` overrides Content-Length so a
/// reply can be cut short.
pub struct StubReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub declared_len: Option<usize>,
}

impl StubReply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type, body: body.into(), declared_len: None }
    }

    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self::new(status, "application/json", value.to_string())
    }
}

/// A client that never routes loopback traffic through an env proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Accepts a single connection on a loopback port, records the request and
/// answers with `reply`. Returns the base URL and the captured request.
pub async fn serve_once(reply: StubReply) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers ended");
            raw.extend_from_slice(&chunk[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos;
            }
        };

        let head = String::from_utf8_lossy(&raw[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap().split(' ');
        let method = request_line.next().unwrap().to_string();
        let target = request_line.next().unwrap().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse::<usize>().unwrap())
            .unwrap_or(0);

        let mut body = raw[head_end + 4..].to_vec();
        while body.len() < content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            body.extend_from_slice(&chunk[..n]);
        }

        let declared = reply.declared_len.unwrap_or(reply.body.len());
        let head = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            reply.status, reply.content_type, declared
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&reply.body).await.unwrap();
        socket.flush().await.unwrap();
        let _ = socket.shutdown().await;

        CapturedRequest { method, target, headers, body }
    });

    (base_url, handle)
}
