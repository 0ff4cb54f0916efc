//! Itinerary persistence and share-link handling.
//!
//! [`ItineraryStore`] wraps the itinerary queries with the addressable
//! location: saving encodes the new id into the location, loading at
//! startup decodes it again. All operations are synchronous and local.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use wayfarer_store::StoreError;
use wayfarer_store::kv::KeyValueStore;
use wayfarer_store::models::ItineraryData;
use wayfarer_store::queries::itineraries::{self as db, LoadError};

use crate::share::{self, AddressBar, AddressError};

/// Why a save failed.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The saved map exists but cannot be decoded; it is left untouched.
    #[error("saved plans are corrupt and were not overwritten: {0}")]
    CorruptStore(#[source] StoreError),

    #[error("failed to write saved plans: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for SaveError {
    fn from(e: StoreError) -> Self {
        if e.is_corrupt() {
            Self::CorruptStore(e)
        } else {
            Self::Storage(e)
        }
    }
}

impl SaveError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::CorruptStore(e) | Self::Storage(e) => e,
        }
    }
}

/// Outcome of [`ItineraryStore::rehydrate`].
#[derive(Debug)]
pub enum Rehydrated {
    /// The location carries no itinerary id.
    NewPlan,
    Loaded(ItineraryData),
    /// The id could not be resolved.
    Failed(LoadError),
}

pub struct ItineraryStore {
    kv: Arc<dyn KeyValueStore>,
    address: Box<dyn AddressBar>,
    base: Url,
    // Location kept here once the address bar refuses a rewrite.
    fallback: Option<Url>,
}

impl ItineraryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, address: Box<dyn AddressBar>, base: Url) -> Self {
        Self {
            kv,
            address,
            base: share::bare(&base),
            fallback: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The current location.
    pub fn location(&self) -> Url {
        match &self.fallback {
            Some(url) => url.clone(),
            None => self.address.current(),
        }
    }

    fn set_location(&mut self, url: Url) {
        if self.fallback.is_none() {
            match self.address.push(url.clone()) {
                Ok(()) => return,
                Err(AddressError::ReadOnly) => {
                    debug!("address is read-only, keeping location in memory");
                }
            }
        }
        self.fallback = Some(url);
    }

    /// Save `data`, assigning an id on first save, and point the location
    /// at its share link.
    pub fn save(&mut self, data: &ItineraryData) -> Result<ItineraryData, SaveError> {
        let saved = db::save_itinerary(self.kv.as_ref(), data).map_err(|e| {
            warn!(error = %e, "failed to save itinerary");
            SaveError::from(e)
        })?;
        if let Some(url) = self.share_token(&saved) {
            self.set_location(url);
        }
        Ok(saved)
    }

    pub fn load(&self, id: &str) -> Result<ItineraryData, LoadError> {
        db::get_itinerary(self.kv.as_ref(), id)
    }

    /// Share link for a saved itinerary; `None` until it has an id.
    pub fn share_token(&self, data: &ItineraryData) -> Option<Url> {
        data.id.as_deref().map(|id| share::share_url(&self.base, id))
    }

    /// Drop any share token from the location.
    pub fn clear_share(&mut self) {
        if share::id_from_url(&self.location()).is_some() {
            self.set_location(self.base.clone());
        }
    }

    /// Resolve the itinerary named by the current location, if any.
    ///
    /// An id that resolves to nothing resets the location to the bare
    /// address. An unreadable store leaves the location alone.
    pub fn rehydrate(&mut self) -> Rehydrated {
        let Some(id) = share::id_from_url(&self.location()) else {
            return Rehydrated::NewPlan;
        };
        match self.load(&id) {
            Ok(data) => Rehydrated::Loaded(data),
            Err(e) => {
                warn!(itinerary_id = %id, error = %e, "failed to load shared itinerary");
                if !matches!(e, LoadError::Unreadable(_)) {
                    self.set_location(self.base.clone());
                }
                Rehydrated::Failed(e)
            }
        }
    }

    /// All saved itineraries, ordered by id.
    pub fn list(&self) -> Result<Vec<ItineraryData>, StoreError> {
        db::list_itineraries(self.kv.as_ref())
    }

    /// Delete a saved itinerary. Returns `true` if it existed.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let removed = db::delete_itinerary(self.kv.as_ref(), id)?;
        if removed && share::id_from_url(&self.location()).as_deref() == Some(id) {
            self.set_location(self.base.clone());
        }
        Ok(removed)
    }
}
