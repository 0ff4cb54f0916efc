//! Generation session: runs gated requests through the AI service and holds
//! the resulting UI state for both request paths.
//!
//! ```text
//! generate(form) --validate--> gate.run --Proceed--> Ticket --run()--> Completed
//!        |                        |                                      |
//!   Failure(validation)     AwaitingCredential                    apply(completed)
//!                                 |                                      |
//!                       submit_credential -> Ticket         normalize -> Success
//!                                                            classify  -> Failure
//! ```
//!
//! A [`Ticket`] owns everything the network phase needs, so the session is
//! not borrowed while a request is in flight. Each path numbers its
//! requests; a completion whose number is no longer the latest for its path
//! is dropped when applied.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use wayfarer_store::StoreError;
use wayfarer_store::kv::KeyValueStore;
use wayfarer_store::models::{Attraction, ItineraryData, Locale};
use wayfarer_store::queries::settings;

use crate::ai::{Completion, CompletionRequest, Credential};
use crate::classify::{self, ErrorInfo, GenerationError};
use crate::form::{ItineraryForm, TripParams};
use crate::gate::{CredentialGate, GateDecision, GateError, GateState};
use crate::i18n::Catalog;
use crate::normalize::{self, ParseFailure, PayloadKind};
use crate::prompt;
use crate::share::AddressBar;
use crate::store::{ItineraryStore, Rehydrated};

/// Longest excerpt of model output written to the log.
const LOG_EXCERPT_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// State of one request path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathState<T> {
    Idle,
    Loading,
    Success(T),
    Failure(ErrorInfo),
}

impl<T> PathState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failure(info) => Some(info),
            _ => None,
        }
    }
}

/// A request held back by the credential gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedRequest {
    Itinerary(TripParams),
    Attractions(String),
}

/// What happened when a request was submitted.
#[derive(Debug)]
pub enum Dispatch {
    /// The request is cleared to run; drive the ticket and apply its result.
    Ready(Ticket),
    /// No credential is stored; one must be requested from the user.
    AwaitingCredential,
    /// The input failed validation. The path is now in `Failure`.
    Rejected(ErrorInfo),
    /// Nothing to do (blank destination).
    Skipped,
    /// The path already has a request in flight.
    Busy,
}

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Page address share links are built on.
    pub base_url: Url,
    /// Upper bound on one AI call.
    pub timeout: Duration,
}

impl SessionConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// One cleared network phase.
pub struct Ticket {
    kind: PayloadKind,
    token: u64,
    request: CompletionRequest,
    credential: Credential,
    completion: Arc<dyn Completion>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticket")
            .field("kind", &self.kind)
            .field("token", &self.token)
            .field("provider", &self.completion.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The raw outcome of a ticket, ready to be applied to the session.
#[derive(Debug)]
pub struct Completed {
    pub kind: PayloadKind,
    pub token: u64,
    pub outcome: Result<String, GenerationError>,
}

impl Ticket {
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// A handle that cancels this ticket alone.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the AI call. Timeout and cancellation resolve to errors.
    pub async fn run(self) -> Completed {
        let Ticket {
            kind,
            token,
            request,
            credential,
            completion,
            timeout,
            cancel,
        } = self;

        debug!(%kind, token, provider = completion.name(), "request started");
        let call = completion.complete(&credential, request);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Err(_) => Err(GenerationError::Timeout(timeout)),
                Ok(Err(e)) => Err(GenerationError::Completion(e)),
                Ok(Ok(response)) => Ok(response.text),
            },
        };

        Completed {
            kind,
            token,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Process-wide session state.
pub struct Session {
    kv: Arc<dyn KeyValueStore>,
    gate: CredentialGate<GatedRequest>,
    store: ItineraryStore,
    completion: Arc<dyn Completion>,
    catalog: Catalog,
    timeout: Duration,
    cancel: CancellationToken,
    itinerary: PathState<ItineraryData>,
    itinerary_token: u64,
    attractions: PathState<Vec<Attraction>>,
    attractions_token: u64,
}

impl Session {
    /// Create the session, loading the stored credential and locale.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        completion: Arc<dyn Completion>,
        address: Box<dyn AddressBar>,
        config: SessionConfig,
    ) -> Result<Self, StoreError> {
        let gate = CredentialGate::load(kv.clone())?;
        let locale = settings::get_locale(kv.as_ref())?;
        let store = ItineraryStore::new(kv.clone(), address, config.base_url);
        Ok(Self {
            kv,
            gate,
            store,
            completion,
            catalog: Catalog::builtin(locale),
            timeout: config.timeout,
            cancel: CancellationToken::new(),
            itinerary: PathState::Idle,
            itinerary_token: 0,
            attractions: PathState::Idle,
            attractions_token: 0,
        })
    }

    // -- accessors ---------------------------------------------------------

    pub fn itinerary(&self) -> &PathState<ItineraryData> {
        &self.itinerary
    }

    pub fn attractions(&self) -> &PathState<Vec<Attraction>> {
        &self.attractions
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn has_credential(&self) -> bool {
        self.gate.has_credential()
    }

    pub fn locale(&self) -> Locale {
        self.catalog.locale()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ItineraryStore {
        &self.store
    }

    /// Switch the language used for prompts and messages, and remember it.
    pub fn set_locale(&mut self, locale: Locale) -> Result<(), StoreError> {
        settings::set_locale(self.kv.as_ref(), locale)?;
        self.catalog = Catalog::builtin(locale);
        Ok(())
    }

    // -- requests ----------------------------------------------------------

    /// Submit an itinerary request.
    ///
    /// The form is validated before the gate is consulted, so invalid input
    /// never waits for a credential and never reaches the network.
    pub fn generate(&mut self, form: &ItineraryForm) -> Dispatch {
        if self.itinerary.is_loading() {
            return Dispatch::Busy;
        }
        match form.validate() {
            Ok(params) => self.dispatch(GatedRequest::Itinerary(params)),
            Err(e) => {
                let error = GenerationError::from(e);
                let info = classify::classify(&error, PayloadKind::Itinerary, &self.catalog);
                debug!(detail = %info.detail, "itinerary form rejected");
                self.itinerary = PathState::Failure(info.clone());
                Dispatch::Rejected(info)
            }
        }
    }

    /// Submit an attraction lookup. A blank destination does nothing.
    pub fn fetch_attractions(&mut self, destination: &str) -> Dispatch {
        let destination = destination.trim();
        if destination.is_empty() {
            return Dispatch::Skipped;
        }
        if self.attractions.is_loading() {
            return Dispatch::Busy;
        }
        self.dispatch(GatedRequest::Attractions(destination.to_string()))
    }

    /// Store a credential and release the request waiting for it, if any.
    pub fn submit_credential(&mut self, raw: &str) -> Result<Option<Ticket>, GateError> {
        Ok(self
            .gate
            .submit(raw)?
            .map(|(request, credential)| self.begin(request, credential)))
    }

    /// Drop the request waiting for a credential.
    pub fn cancel_credential(&mut self) -> bool {
        self.gate.cancel()
    }

    fn dispatch(&mut self, request: GatedRequest) -> Dispatch {
        match self.gate.run(request) {
            GateDecision::Proceed { action, credential } => {
                Dispatch::Ready(self.begin(action, credential))
            }
            GateDecision::Deferred => Dispatch::AwaitingCredential,
        }
    }

    /// Enter the network phase for `request` and issue its ticket.
    fn begin(&mut self, request: GatedRequest, credential: Credential) -> Ticket {
        let locale = self.locale();
        let (kind, token, request) = match request {
            GatedRequest::Itinerary(params) => {
                self.itinerary_token += 1;
                self.itinerary = PathState::Loading;
                self.store.clear_share();
                info!(destination = %params.destination, days = params.duration_days, "generating itinerary");
                (
                    PayloadKind::Itinerary,
                    self.itinerary_token,
                    prompt::itinerary_request(&params, locale),
                )
            }
            GatedRequest::Attractions(destination) => {
                self.attractions_token += 1;
                self.attractions = PathState::Loading;
                info!(%destination, "fetching attractions");
                (
                    PayloadKind::Attractions,
                    self.attractions_token,
                    prompt::attractions_request(&destination, locale),
                )
            }
        };
        Ticket {
            kind,
            token,
            request,
            credential,
            completion: self.completion.clone(),
            timeout: self.timeout,
            cancel: self.cancel.child_token(),
        }
    }

    /// Apply a finished ticket. Returns `false` if it was stale and ignored.
    pub fn apply(&mut self, completed: Completed) -> bool {
        let Completed {
            kind,
            token,
            outcome,
        } = completed;

        let (latest, loading) = match kind {
            PayloadKind::Itinerary => (self.itinerary_token, self.itinerary.is_loading()),
            PayloadKind::Attractions => (self.attractions_token, self.attractions.is_loading()),
        };
        if token != latest || !loading {
            debug!(%kind, token, latest, "discarding stale completion");
            return false;
        }

        let result = outcome.and_then(|raw| match kind {
            PayloadKind::Itinerary => normalize::normalize_itinerary(&raw)
                .map(|data| self.itinerary = PathState::Success(data))
                .map_err(GenerationError::from),
            PayloadKind::Attractions => normalize::normalize_attractions(&raw)
                .map(|list| self.attractions = PathState::Success(list))
                .map_err(GenerationError::from),
        });

        if let Err(error) = result {
            let info = self.fail(kind, &error);
            match kind {
                PayloadKind::Itinerary => self.itinerary = PathState::Failure(info),
                PayloadKind::Attractions => self.attractions = PathState::Failure(info),
            }
        }
        true
    }

    fn fail(&mut self, kind: PayloadKind, error: &GenerationError) -> ErrorInfo {
        if let GenerationError::Parse(ParseFailure::MalformedPayload {
            candidate,
            raw,
            reason,
        }) = error
        {
            warn!(
                %kind,
                %reason,
                candidate = %truncate_for_log(candidate, LOG_EXCERPT_CHARS),
                raw = %truncate_for_log(raw, LOG_EXCERPT_CHARS),
                "failed to parse AI response"
            );
        }

        let info = classify::classify(error, kind, &self.catalog);
        warn!(%kind, error_kind = %info.kind, detail = %info.detail, "request failed");

        if info.is_auth() {
            if let Err(e) = self.gate.invalidate() {
                warn!(error = %e, "failed to clear stored API key");
            }
        }
        info
    }

    /// Run a ticket to completion and apply it.
    pub async fn drive(&mut self, ticket: Ticket) -> bool {
        let completed = ticket.run().await;
        self.apply(completed)
    }

    /// Cancel every ticket issued so far. Their paths move to `Failure`
    /// once the cancelled completions are applied.
    pub fn cancel_in_flight(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }

    // -- plan lifecycle ----------------------------------------------------

    /// Forget the current itinerary and any in-flight generation. Saved
    /// plans are untouched.
    pub fn start_new_plan(&mut self) {
        self.itinerary_token += 1;
        self.itinerary = PathState::Idle;
        self.store.clear_share();
    }

    /// Save the current itinerary, replacing it with the id-bearing copy.
    ///
    /// Returns `Ok(None)` when there is nothing to save. On a storage
    /// failure the unsaved itinerary stays in place and the error is
    /// returned for display alongside it.
    pub fn save_current(&mut self) -> Result<Option<ItineraryData>, ErrorInfo> {
        let Some(data) = self.itinerary.success() else {
            return Ok(None);
        };
        match self.store.save(data) {
            Ok(saved) => {
                self.itinerary = PathState::Success(saved.clone());
                Ok(Some(saved))
            }
            Err(e) => {
                let info = classify::classify_save(e.store_error(), &self.catalog);
                debug!(error = %e, "itinerary kept unsaved");
                Err(info)
            }
        }
    }

    /// Load the itinerary named by the current location into the session.
    pub fn rehydrate(&mut self) -> &PathState<ItineraryData> {
        self.itinerary = match self.store.rehydrate() {
            Rehydrated::NewPlan => PathState::Idle,
            Rehydrated::Loaded(data) => PathState::Success(data),
            Rehydrated::Failed(e) => PathState::Failure(classify::classify_load(&e, &self.catalog)),
        };
        &self.itinerary
    }
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={char_count}]"));
    preview
}
