//! Credential gate: holds back gated actions until an API key is known.
//!
//! ```text
//!             run(a), key stored
//!        +----------------------------> Proceed(a)
//!        |
//!      Idle --run(a), no key--> AwaitingCredential { pending: a }
//!        ^                          |   |   |
//!        |      submit(key) -> a ---+   |   +-- run(b): pending = b
//!        +------------------------------+
//!                  cancel() -> a dropped
//! ```
//!
//! The pending slot holds at most one action; a newer one replaces the
//! older. An action taken out of the slot is handed back exactly once.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use wayfarer_store::StoreError;
use wayfarer_store::kv::KeyValueStore;
use wayfarer_store::queries::settings;

use crate::ai::Credential;

/// Observable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    AwaitingCredential,
}

/// What [`CredentialGate::run`] decided.
#[derive(Debug)]
pub enum GateDecision<A> {
    /// A credential is available; run `action` now.
    Proceed { action: A, credential: Credential },
    /// The action was parked; a credential must be requested from the user.
    Deferred,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("the API key is empty")]
    BlankCredential,

    #[error("failed to store the API key: {0}")]
    Store(#[from] StoreError),
}

/// Gate over actions of type `A`, backed by the credential stored in `kv`.
pub struct CredentialGate<A> {
    kv: Arc<dyn KeyValueStore>,
    credential: Option<Credential>,
    pending: Option<A>,
}

impl<A> CredentialGate<A> {
    /// Create a gate, picking up any credential already in the store.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let credential = settings::get_api_key(kv.as_ref())?
            .as_deref()
            .and_then(Credential::new);
        Ok(Self {
            kv,
            credential,
            pending: None,
        })
    }

    pub fn state(&self) -> GateState {
        if self.pending.is_some() {
            GateState::AwaitingCredential
        } else {
            GateState::Idle
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// The parked action, if any.
    pub fn pending(&self) -> Option<&A> {
        self.pending.as_ref()
    }

    /// Run `action` if a credential is known, otherwise park it.
    ///
    /// While awaiting, a new action overwrites the parked one.
    pub fn run(&mut self, action: A) -> GateDecision<A> {
        match (&self.pending, &self.credential) {
            (None, Some(credential)) => GateDecision::Proceed {
                action,
                credential: credential.clone(),
            },
            _ => {
                if self.pending.replace(action).is_some() {
                    debug!("replaced pending gated action");
                }
                GateDecision::Deferred
            }
        }
    }

    /// Store `raw` as the credential and release the parked action.
    ///
    /// A blank value is rejected and leaves the gate as it was. Returns the
    /// released action with the new credential, or `None` when nothing was
    /// parked.
    pub fn submit(&mut self, raw: &str) -> Result<Option<(A, Credential)>, GateError> {
        let credential = Credential::new(raw).ok_or(GateError::BlankCredential)?;
        settings::set_api_key(self.kv.as_ref(), credential.expose())?;
        self.credential = Some(credential.clone());
        info!(released = self.pending.is_some(), "API key stored");
        Ok(self.pending.take().map(|action| (action, credential)))
    }

    /// Drop the parked action without running it. Returns `true` if there
    /// was one.
    pub fn cancel(&mut self) -> bool {
        let had_pending = self.pending.take().is_some();
        if had_pending {
            debug!("pending gated action cancelled");
        }
        had_pending
    }

    /// Forget the credential after the service rejected it.
    ///
    /// The in-memory copy is dropped even if removing the stored copy
    /// fails, so the next gated action asks again.
    pub fn invalidate(&mut self) -> Result<(), StoreError> {
        self.credential = None;
        info!("API key invalidated");
        settings::clear_api_key(self.kv.as_ref())
    }
}
