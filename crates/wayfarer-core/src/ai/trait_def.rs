//! The `Completion` trait -- the adapter interface for generative-AI
//! providers.
//!
//! The rest of the crate treats the model as a black box: a prompt and some
//! options go in, raw text comes out. The trait is object-safe so a session
//! can hold an `Arc<dyn Completion>`.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{CompletionError, CompletionRequest, CompletionResponse, Credential};

/// A generative-AI text completion capability.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Run one completion using `credential` for authentication.
    ///
    /// Implementations return the model text untouched; normalization is
    /// the caller's job. An empty body is a successful, empty response.
    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}

#[async_trait]
impl Completion for Arc<dyn Completion> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        (**self).complete(credential, request).await
    }
}

// Compile-time assertion: Completion must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Completion) {}
};
