//! Request, response and error types shared by completion providers.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// An opaque API credential.
///
/// The secret is never printed by `Debug`; call [`Credential::expose`] to
/// hand it to a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential, trimming surrounding whitespace. Returns `None`
    /// for a blank value.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A provider-side tool the model may use while answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Grounding through live web search.
    WebSearch,
}

/// Per-request generation options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// JSON schema the response must conform to.
    pub structured_output_schema: Option<Value>,
    /// Response MIME type, e.g. `application/json`.
    pub response_mime_type: Option<String>,
    pub tools: Vec<Tool>,
}

/// A single prompt sent to a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// The raw text of a completion. May be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

/// Errors from a completion provider.
///
/// The message text is what the error classifier inspects, so upstream
/// messages are carried verbatim.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The request never got a response (DNS, TLS, connection reset, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// The provider answered with an error status.
    #[error("HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The provider answered successfully but the envelope was unreadable.
    #[error("invalid response from AI service: {0}")]
    Response(String),
}
