use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<Value>,
}

/// What the model chose to do with a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Text(String),
    ToolCall { name: String, arguments: String },
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("completion response was malformed: {0}")]
    Malformed(String),
    #[error("completion api key is not configured")]
    MissingApiKey,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<CompletionOutcome, CompletionError>;
}

/// Chat-completion client for the Mistral API (OpenAI-compatible wire
/// format, tool calls included).
pub struct MistralClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl MistralClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout_secs: u64,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({ "role": "system", "content": request.system }));
        for message in &request.messages {
            messages.push(json!({ "role": message.role, "content": message.content }));
        }

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(request.tools.clone());
            body["tool_choice"] = Value::String("auto".to_string());
        }
        body
    }

    async fn send_once(&self, body: &Value) -> Result<CompletionOutcome, CompletionError> {
        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Endpoint { status: status.as_u16(), body });
        }

        let payload: CompletionPayload = response.json().await?;
        outcome_from_payload(payload)
    }
}

// Exactly one completion request per guest turn. A failed call surfaces
// as an error the caller reports to the guest, who decides whether to
// retry; there is no automatic retry or backoff.
#[async_trait]
impl CompletionClient for MistralClient {
    async fn complete(&self, request: &ChatRequest) -> Result<CompletionOutcome, CompletionError> {
        let body = self.request_body(request);
        self.send_once(&body).await
    }
}

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    function: FunctionPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionPayload {
    name: String,
    arguments: String,
}

fn outcome_from_payload(payload: CompletionPayload) -> Result<CompletionOutcome, CompletionError> {
    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Malformed("response carried no choices".to_string()))?;

    if let Some(mut tool_calls) = choice.message.tool_calls.filter(|calls| !calls.is_empty()) {
        let call = tool_calls.remove(0);
        return Ok(CompletionOutcome::ToolCall {
            name: call.function.name,
            arguments: call.function.arguments,
        });
    }

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(CompletionOutcome::Text(content)),
        _ => Err(CompletionError::Malformed("response had neither text nor a tool call".to_string())),
    }
}
