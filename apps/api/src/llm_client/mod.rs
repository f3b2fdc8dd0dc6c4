/// LLM Client: the single point of entry for every upstream model call in fitcheck.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Critics and the editor receive an `Arc<dyn ChatModel>` built here at startup.
///
/// There is deliberately no retry loop. A failed call is a failed critic; the
/// orchestrator recovers by escalating to a different provider.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Hard-coded model choices. Not configurable, to keep critic behaviour reproducible.
pub const CRITIC_A_MODEL: &str = "gemini-2.0-flash";
pub const CRITIC_B_MODEL: &str = "gpt-4o-mini";
pub const CRITIC_C_MODEL: &str = "claude-3-5-haiku-latest";
pub const EDITOR_MODEL: &str = "gpt-4.1-mini";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No JSON object found in model output")]
    NoJsonObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

/// Provider-neutral request. Each provider maps it onto its own wire shape.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider for a JSON-object response where it supports one.
    pub json_mode: bool,
}

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// All three providers report errors as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// A handle to one provider/model pair. Cheap to clone; the reqwest pool is shared.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: Provider,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(client: Client, provider: Provider, api_key: String, model: &str) -> Self {
        Self {
            client,
            provider,
            api_key,
            model: model.to_string(),
        }
    }

    /// Shared HTTP client for all providers. Per-call bounds are enforced by the
    /// caller's timeout race, so this only guards against sockets that never close.
    pub fn http_client() -> reqwest::Result<Client> {
        Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let response = builder
            .header("content-type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn call_anthropic(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![ChatMessage {
                role: "user",
                content: request.user,
            }],
        };

        let response = self
            .send(
                self.client
                    .post(ANTHROPIC_API_URL)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body),
            )
            .await?;

        let parsed: AnthropicResponse = decode_envelope(&response.text().await?)?;
        debug!(
            "anthropic call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        parsed
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
            .ok_or(LlmError::EmptyContent)
    }

    async fn call_openai(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let body = OpenAiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            response_format: request
                .json_mode
                .then(|| json!({ "type": "json_object" })),
        };

        let response = self
            .send(
                self.client
                    .post(OPENAI_API_URL)
                    .bearer_auth(&self.api_key)
                    .json(&body),
            )
            .await?;

        let parsed: OpenAiResponse = decode_envelope(&response.text().await?)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    async fn call_gemini(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        // Gemini gets the system text inline, ahead of the user prompt.
        let prompt = format!("{}\n{}", request.system, request.user);
        let mut generation_config = json!({
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens,
        });
        if request.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        });

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let response = self
            .send(
                self.client
                    .post(url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&body),
            )
            .await?;

        let parsed: GeminiResponse = decode_envelope(&response.text().await?)?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        match self.provider {
            Provider::Anthropic => self.call_anthropic(request).await,
            Provider::OpenAi => self.call_openai(request).await,
            Provider::Gemini => self.call_gemini(request).await,
        }
    }
}

/// Returns the slice from the first `{` to the last `}`.
/// Models sometimes wrap JSON in prose or markdown fences.
/// Parses a 200 response body. A body that does not match the expected envelope is a
/// parse error, not a transport error.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, LlmError> {
    Ok(serde_json::from_str(body)?)
}

pub fn extract_json_object(text: &str) -> Result<&str, LlmError> {
    let start = text.find('{').ok_or(LlmError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(LlmError::NoJsonObject)?;
    if end <= start {
        return Err(LlmError::NoJsonObject);
    }
    Ok(&text[start..=end])
}
