//! Failure classification.
//!
//! Every failure on a generation path ends up as an [`ErrorInfo`]: a coarse
//! [`ErrorKind`] the session acts on, plus a translated message to show.
//! Classification looks only at inspectable content (the failure variant and
//! its text), never at concrete transport error types.
//!
//! Rules, first match wins:
//!
//! ```text
//! ParseFailure                         -> parse
//! auth / permission / API-key signal   -> auth
//! form validation                      -> validation
//! transport, timeout, network signal   -> network
//! anything else                        -> unknown
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use wayfarer_store::StoreError;
use wayfarer_store::queries::itineraries::LoadError;

use crate::ai::CompletionError;
use crate::form::FormError;
use crate::i18n::Translate;
use crate::normalize::{ParseFailure, PayloadKind};

/// Coarse failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Parse,
    Network,
    Validation,
    Unknown,
    /// Saved plans could not be read or written.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Parse => "parse",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}

/// A classified, displayable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// Translated text for the user.
    pub user_message: String,
    /// Untranslated description of the underlying failure, for logs.
    pub detail: String,
}

impl ErrorInfo {
    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)
    }
}

/// Anything that can go wrong between submitting a request and holding a
/// typed result.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error(transparent)]
    Validation(#[from] FormError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    /// Free-form failure text, e.g. relayed from another process.
    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Text signals
// ---------------------------------------------------------------------------

const AUTH_SIGNALS: &[&str] = &[
    "api key",
    "api_key",
    "apikey",
    "permission",
    "authentication",
    "unauthorized",
    "unauthenticated",
];

const NETWORK_SIGNALS: &[&str] = &[
    "network",
    "timed out",
    "timeout",
    "connection",
    "dns",
    "unreachable",
    "failed to fetch",
    "offline",
];

fn contains_any(text: &str, signals: &[&str]) -> bool {
    let lower = text.to_lowercase();
    signals.iter().any(|s| lower.contains(s))
}

/// Whether `text` carries an authentication, permission or API-key signal.
pub fn has_auth_signal(text: &str) -> bool {
    contains_any(text, AUTH_SIGNALS)
}

/// Whether `text` carries a transport-level signal.
pub fn has_network_signal(text: &str) -> bool {
    contains_any(text, NETWORK_SIGNALS)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The category of `error`, without building a message.
pub fn kind_of(error: &GenerationError) -> ErrorKind {
    match error {
        GenerationError::Parse(_) => return ErrorKind::Parse,
        GenerationError::Completion(CompletionError::Upstream { status, .. })
            if matches!(*status, 401 | 403) =>
        {
            return ErrorKind::Auth;
        }
        _ => {}
    }

    let text = error.to_string();
    if has_auth_signal(&text) {
        return ErrorKind::Auth;
    }

    match error {
        GenerationError::Validation(_) => ErrorKind::Validation,
        GenerationError::Completion(CompletionError::Transport(_))
        | GenerationError::Timeout(_)
        | GenerationError::Cancelled => ErrorKind::Network,
        GenerationError::Completion(CompletionError::Upstream { status, .. })
            if *status == 429 || *status >= 500 =>
        {
            ErrorKind::Network
        }
        _ if has_network_signal(&text) => ErrorKind::Network,
        _ => ErrorKind::Unknown,
    }
}

/// Classify a failure on the itinerary or attraction path.
///
/// The attraction path uses its own generic message for every kind except
/// `auth` and `validation`.
pub fn classify(error: &GenerationError, path: PayloadKind, tr: &dyn Translate) -> ErrorInfo {
    let kind = kind_of(error);
    let key = match (kind, path) {
        (ErrorKind::Auth, _) => "apiKeyModalError",
        (ErrorKind::Validation, _) => match error {
            GenerationError::Validation(FormError::InvalidDuration(_)) => {
                "durationValidationError"
            }
            _ => "formValidationAlert",
        },
        (_, PayloadKind::Attractions) => "attractionsError",
        (ErrorKind::Parse, _) => "errorUnusableFormat",
        (ErrorKind::Network, _) => "errorNetwork",
        (ErrorKind::Unknown | ErrorKind::Storage, _) => "errorUnknown",
    };
    ErrorInfo {
        kind,
        user_message: tr.t(key),
        detail: error.to_string(),
    }
}

/// Classify a failed lookup of a saved itinerary.
pub fn classify_load(error: &LoadError, tr: &dyn Translate) -> ErrorInfo {
    let key = match error {
        LoadError::NoSavedPlans => "itineraryNoSavedPlans",
        LoadError::NotFound { .. } => "itineraryNotFoundError",
        LoadError::Unreadable(_) => "itineraryLoadError",
    };
    ErrorInfo {
        kind: ErrorKind::Storage,
        user_message: tr.t(key),
        detail: error.to_string(),
    }
}

/// Classify a failed save.
pub fn classify_save(error: &StoreError, tr: &dyn Translate) -> ErrorInfo {
    ErrorInfo {
        kind: ErrorKind::Storage,
        user_message: tr.t("itinerarySaveError"),
        detail: error.to_string(),
    }
}
