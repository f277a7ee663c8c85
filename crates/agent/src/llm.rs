use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use caliope_core::config::{LlmConfig, LlmProvider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    Gemini,
    OpenAi,
    Ollama,
}

/// Text completion over the provider's REST API.
pub struct HttpLlmClient {
    client: Client,
    backend: Backend,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for HttpLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLlmClient")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpLlmClient {
    /// Returns `None` when the provider is disabled or lacks credentials.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        if !config.is_usable() {
            return Ok(None);
        }

        let (backend, default_base) = match config.provider {
            LlmProvider::Disabled => return Ok(None),
            LlmProvider::Gemini => (Backend::Gemini, Some(GEMINI_BASE_URL)),
            LlmProvider::OpenAi => (Backend::OpenAi, Some(OPENAI_BASE_URL)),
            LlmProvider::Ollama => (Backend::Ollama, None),
        };

        let base_url = config
            .base_url
            .as_deref()
            .or(default_base)
            .ok_or_else(|| anyhow!("llm.base_url is required for provider `ollama`"))?
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build LLM HTTP client")?;

        Ok(Some(Self {
            client,
            backend,
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }))
    }

    fn endpoint(&self) -> String {
        match self.backend {
            Backend::Gemini => {
                format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
            }
            Backend::OpenAi => format!("{}/v1/chat/completions", self.base_url),
            Backend::Ollama => format!("{}/api/generate", self.base_url),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        match self.backend {
            Backend::Gemini => json!({ "contents": [{ "parts": [{ "text": prompt }] }] }),
            Backend::OpenAi => json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            Backend::Ollama => json!({ "model": self.model, "prompt": prompt, "stream": false }),
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(prompt));
        match (self.backend, self.api_key.as_ref()) {
            (Backend::Gemini, Some(key)) => {
                request = request.header("x-goog-api-key", key.expose_secret());
            }
            (Backend::OpenAi, Some(key)) => request = request.bearer_auth(key.expose_secret()),
            _ => {}
        }

        let response = request
            .send()
            .await
            .context("LLM request failed")?
            .error_for_status()
            .context("LLM provider returned an error status")?;
        let payload: Value = response.json().await.context("LLM response was not JSON")?;

        extract_text(self.backend, payload)
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

fn extract_text(backend: Backend, payload: Value) -> Result<String> {
    let text = match backend {
        Backend::Gemini => {
            let decoded: GeminiResponse =
                serde_json::from_value(payload).context("unexpected Gemini response shape")?;
            decoded
                .candidates
                .into_iter()
                .next()
                .map(|candidate| {
                    candidate.content.parts.into_iter().map(|part| part.text).collect::<String>()
                })
        }
        Backend::OpenAi => {
            let decoded: ChatResponse =
                serde_json::from_value(payload).context("unexpected chat response shape")?;
            decoded.choices.into_iter().next().and_then(|choice| choice.message.content)
        }
        Backend::Ollama => {
            let decoded: OllamaResponse =
                serde_json::from_value(payload).context("unexpected Ollama response shape")?;
            Some(decoded.response)
        }
    };

    text.filter(|text| !text.trim().is_empty())
        .ok_or_else(|| anyhow!("LLM response contained no text"))
}
