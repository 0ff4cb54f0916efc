//! Generative-AI provider interface.
//!
//! ```text
//! Session
//!     |
//!     v
//! Arc<dyn Completion> --complete(credential, request)--> CompletionResponse { text }
//!     |
//!     +-- GeminiClient (HTTP, generateContent)
//! ```

pub mod gemini;
pub mod trait_def;
pub mod types;

pub use gemini::{GeminiClient, GeminiConfig};
pub use trait_def::Completion;
pub use types::{
    CompletionError, CompletionOptions, CompletionRequest, CompletionResponse, Credential, Tool,
};
