//! Language model client.
//!
//! [`TextGenerator`] is the seam the summarizer talks to; [`OllamaClient`]
//! implements it against an Ollama-compatible `/api/chat` endpoint.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use newsbrief_shared::{ModelConfig, NewsbriefError, Result};

/// Sampling temperature sent with every request. Fixed at zero so the same
/// articles produce the same briefing.
const TEMPERATURE: f32 = 0.0;

/// Turns one prompt into one completion.
pub trait TextGenerator {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send `prompt` and return the model's reply verbatim.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// Non-streaming chat client for an Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
        }
    }
}

impl TextGenerator for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: TEMPERATURE,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NewsbriefError::Model(format!("failed to reach {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NewsbriefError::Model(format!(
                "chat request failed ({status}): {body}"
            )));
        }

        let reply: ChatResponse = resp
            .json()
            .await
            .map_err(|e| NewsbriefError::Model(format!("unreadable chat response: {e}")))?;

        debug!(reply_chars = reply.message.content.chars().count(), "model replied");
        Ok(reply.message.content)
    }
}
