//! Gemini `generateContent` provider.
//!
//! Sends one user turn per request and concatenates the text parts of the
//! first candidate. A blocked prompt or a candidate without text yields an
//! empty response, which the normalizer reports as
//! [`crate::normalize::ParseFailure::EmptyResponse`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::trait_def::Completion;
use super::types::{
    CompletionError, CompletionOptions, CompletionRequest, CompletionResponse, Credential, Tool,
};

/// Configuration for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base, without a trailing slash.
    pub endpoint: String,
    pub model: String,
    /// Transport-level timeout for one HTTP exchange.
    pub timeout: Duration,
}

impl GeminiConfig {
    pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// URL of the `generateContent` method for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn build_body(request: &CompletionRequest) -> GenerateRequest {
    let CompletionOptions {
        structured_output_schema,
        response_mime_type,
        tools,
    } = &request.options;

    let tools = tools
        .iter()
        .map(|tool| match tool {
            Tool::WebSearch => serde_json::json!({ "google_search": {} }),
        })
        .collect();

    let generation_config = if structured_output_schema.is_some() || response_mime_type.is_some() {
        Some(GenerationConfig {
            response_mime_type: response_mime_type.clone(),
            response_schema: structured_output_schema.clone(),
        })
    } else {
        None
    };

    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![RequestPart {
                text: request.prompt.clone(),
            }],
        }],
        tools,
        generation_config,
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> String {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        debug!(block_reason = %reason, "prompt blocked by provider");
        return String::new();
    }
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Turn an error body into a message, keeping the provider's own wording.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({status})", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl Completion for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(credential.expose()).map_err(|_| {
                CompletionError::Upstream {
                    status: 400,
                    message: "API key contains characters that are not allowed".to_string(),
                }
            })?,
        );

        let body = build_body(&request);
        debug!(model = %self.config.model, tools = body.tools.len(), "sending generateContent");

        let response = self
            .client
            .post(self.config.generate_url())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Response(e.to_string()))?;

        Ok(CompletionResponse {
            text: response_text(parsed),
        })
    }
}
