//! Origin classification through a local Ollama chat endpoint.
//!
//! The reply is streamed and only its first non-empty token is read; the
//! stream is dropped right after, which closes the connection.

use anyhow::{bail, Context, Result};
use marquee_core::classify::DEFAULT_PROMPT;
use marquee_core::Classification;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:12b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Outcome of reading one streamed line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Token(String),
    Continue,
    Done,
}

fn read_line(line: &str) -> Result<Step> {
    let line = line.trim();
    if line.is_empty() { return Ok(Step::Continue); }
    let chunk: ChatChunk = serde_json::from_str(line).context("decoding chat stream line")?;
    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    let token = content.trim();
    if !token.is_empty() { return Ok(Step::Token(token.to_string())); }
    Ok(if chunk.done { Step::Done } else { Step::Continue })
}

/// First non-empty token among complete NDJSON lines of `buf`, draining the
/// lines it consumed. `None` means more input is needed.
fn first_token_from_lines(buf: &mut Vec<u8>) -> Result<Option<String>> {
    while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        match read_line(&String::from_utf8_lossy(&line))? {
            Step::Token(t) => return Ok(Some(t)),
            Step::Done => return Ok(Some(String::new())),
            Step::Continue => {}
        }
    }
    Ok(None)
}

pub struct Classifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Classify cleaned lead prose. Transport and protocol errors are
    /// returned; a reply that is not a digit 0-5 is `Unrecognized`.
    pub async fn classify(&self, prose: &str) -> Result<Classification> {
        let token = self.first_token(prose).await?;
        Ok(Classification::from_first_token(&token))
    }

    async fn first_token(&self, prose: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.endpoint.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: format!("{}\n\n{}", self.config.prompt, prose) }],
            stream: true,
            options: ChatOptions { temperature: 0.0 },
        };
        let mut resp = self.client.post(&url).json(&request).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP {} from {url}", resp.status());
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(bytes) = resp.chunk().await? {
            buf.extend_from_slice(&bytes);
            if let Some(token) = first_token_from_lines(&mut buf)? {
                return Ok(token);
            }
        }
        // Stream ended without a trailing newline.
        buf.push(b'\n');
        Ok(first_token_from_lines(&mut buf)?.unwrap_or_default())
    }
}
