//! Shared test utilities for wayfarer integration tests.
//!
//! - [`ScriptedCompletion`]: an AI provider that replays queued replies and
//!   records every request it receives.
//! - [`TempStore`]: a [`FileStore`] in a temporary directory, removed on drop.
//! - Sample itineraries and model replies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use wayfarer_core::ai::{
    Completion, CompletionError, CompletionRequest, CompletionResponse, Credential,
};
use wayfarer_store::config::StoreConfig;
use wayfarer_store::kv::FileStore;
use wayfarer_store::models::ItineraryData;

// ---------------------------------------------------------------------------
// Scripted AI provider
// ---------------------------------------------------------------------------

/// A request as seen by [`ScriptedCompletion`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub credential: String,
    pub request: CompletionRequest,
}

/// Replays queued replies in order. Once the queue is empty every call
/// fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A provider that answers with each of `texts` in turn.
    pub fn with_texts<I, S>(texts: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scripted = Self::default();
        for text in texts {
            scripted.push_text(text);
        }
        Arc::new(scripted)
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Ok(text.into()));
    }

    pub fn push_error(&self, error: CompletionError) {
        self.push(Err(error));
    }

    fn push(&self, reply: Result<String, CompletionError>) {
        self.replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(reply);
    }

    /// Number of `complete` calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Prompts of all recorded calls, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.request.prompt)
            .collect()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedCall {
                credential: credential.expose().to_string(),
                request,
            });
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        reply
            .unwrap_or_else(|| Err(CompletionError::Transport("no scripted reply".into())))
            .map(|text| CompletionResponse { text })
    }
}

// ---------------------------------------------------------------------------
// Temporary on-disk store
// ---------------------------------------------------------------------------

/// A file-backed store in its own temporary directory.
pub struct TempStore {
    pub dir: TempDir,
    pub config: StoreConfig,
    pub store: Arc<FileStore>,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = StoreConfig::new(dir.path());
        let store = Arc::new(FileStore::open(&config));
        Self { dir, config, store }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A two-day itinerary as the model would write it, bare JSON.
pub const SAMPLE_ITINERARY_JSON: &str = r#"{
  "tripTitle": "Lisbon Light",
  "tripRequirements": ["Book flights to LIS", "Pack comfortable shoes"],
  "itinerary": [
    {
      "day": 1,
      "title": "Alfama",
      "description": "Old town and viewpoints",
      "activities": [
        {"time": "9:00 AM", "description": "Castelo de São Jorge", "icon": "🏰",
         "tip": "Go early", "estimatedCost": "€15",
         "latitude": 38.7139, "longitude": -9.1335},
        {"time": "Evening", "description": "Fado dinner", "icon": "🎶"}
      ]
    },
    {
      "day": 2,
      "title": "Belém",
      "description": "Monuments by the river",
      "activities": [
        {"time": "10:00 AM", "description": "Jerónimos Monastery", "icon": "⛪",
         "latitude": 38.6979, "longitude": -9.2068}
      ]
    }
  ],
  "suggestedCompanies": [
    {"name": "Lisbon Walker", "description": "Walking tours", "website": "lisbonwalker.example"},
    {"name": "Fado Tours", "description": "Music nights", "website": "https://fadotours.example"}
  ]
}"#;

/// [`SAMPLE_ITINERARY_JSON`] wrapped in prose and a fenced block.
pub fn sample_itinerary_reply() -> String {
    format!("Here is your plan!\n\n```json\n{SAMPLE_ITINERARY_JSON}\n```\n\nEnjoy your trip.")
}

/// [`SAMPLE_ITINERARY_JSON`] decoded, without an id.
pub fn sample_itinerary() -> ItineraryData {
    serde_json::from_str(SAMPLE_ITINERARY_JSON).expect("sample itinerary is valid")
}

/// A schema-constrained attractions reply.
pub const SAMPLE_ATTRACTIONS_JSON: &str = r#"[
  {"name": "Belém Tower", "description": "Fortified tower", "category": "Landmarks & Monuments"},
  {"name": "Gulbenkian Museum", "description": "Art collection", "category": "Museums & Galleries"},
  {"name": "LX Factory", "description": "Creative hub", "category": "Street Art"},
  {"name": "Sintra Hills", "description": "Palaces and forest", "category": "Nature & Parks"}
]"#;
