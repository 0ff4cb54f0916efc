//! Query functions for the persisted itinerary map.
//!
//! All saved itineraries live in one JSON object (`id -> ItineraryData`)
//! under [`ITINERARIES_KEY`]. Every save rewrites the whole object; entries
//! are never evicted.

use std::collections::BTreeMap;

use rand::Rng;
use thiserror::Error;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::models::ItineraryData;

/// Storage key holding the serialized itinerary map.
pub const ITINERARIES_KEY: &str = "ai-travel-planner-itineraries";

/// Length of a generated itinerary id.
pub const ID_LEN: usize = 9;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The decoded itinerary map, ordered by id.
pub type PersistedItineraries = BTreeMap<String, ItineraryData>;

/// Why a lookup produced no itinerary.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing has ever been saved (or the saved map is empty).
    #[error("no saved plans")]
    NoSavedPlans,

    /// Plans are saved, but none under this id.
    #[error("itinerary {id:?} not found")]
    NotFound { id: String },

    /// The saved map could not be read or decoded. Reads treat this as
    /// "not found"; it is kept distinct so callers can say why.
    #[error("saved plans are unreadable: {0}")]
    Unreadable(#[source] StoreError),
}

/// Generate a short, URL-safe random itinerary id.
///
/// Nine base-36 characters; collisions are not checked.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Read and decode the whole itinerary map.
///
/// Returns `Ok(None)` when the key has never been written.
pub fn read_all(store: &dyn KeyValueStore) -> Result<Option<PersistedItineraries>, StoreError> {
    let Some(raw) = store.get(ITINERARIES_KEY)? else {
        return Ok(None);
    };
    let map = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
        key: ITINERARIES_KEY.to_string(),
        source: e,
    })?;
    Ok(Some(map))
}

fn write_all(store: &dyn KeyValueStore, map: &PersistedItineraries) -> Result<(), StoreError> {
    let raw = serde_json::to_string(map).map_err(|e| StoreError::Serialize {
        key: ITINERARIES_KEY.to_string(),
        source: e,
    })?;
    store.set(ITINERARIES_KEY, &raw)
}

/// Insert or overwrite an itinerary, assigning an id if it has none.
///
/// Returns the stored copy, whose `id` is always set. A corrupt map is
/// reported as an error rather than overwritten.
pub fn save_itinerary(
    store: &dyn KeyValueStore,
    data: &ItineraryData,
) -> Result<ItineraryData, StoreError> {
    let mut map = read_all(store)?.unwrap_or_default();

    let id = data.id.clone().unwrap_or_else(generate_id);
    let saved = ItineraryData {
        id: Some(id.clone()),
        ..data.clone()
    };

    map.insert(id.clone(), saved.clone());
    write_all(store, &map)?;

    tracing::info!(itinerary_id = %id, total = map.len(), "itinerary saved");
    Ok(saved)
}

/// Look up one itinerary by id.
pub fn get_itinerary(store: &dyn KeyValueStore, id: &str) -> Result<ItineraryData, LoadError> {
    let map = match read_all(store) {
        Ok(Some(map)) => map,
        Ok(None) => return Err(LoadError::NoSavedPlans),
        Err(e) => return Err(LoadError::Unreadable(e)),
    };

    if map.is_empty() {
        return Err(LoadError::NoSavedPlans);
    }

    map.get(id).cloned().ok_or_else(|| LoadError::NotFound { id: id.to_owned() })
}

/// List all saved itineraries, ordered by id.
pub fn list_itineraries(store: &dyn KeyValueStore) -> Result<Vec<ItineraryData>, StoreError> {
    Ok(read_all(store)?
        .map(|m| m.into_values().collect())
        .unwrap_or_default())
}

/// Delete one itinerary. Returns `true` if it existed.
pub fn delete_itinerary(store: &dyn KeyValueStore, id: &str) -> Result<bool, StoreError> {
    let Some(mut map) = read_all(store)? else {
        return Ok(false);
    };
    if map.remove(id).is_none() {
        return Ok(false);
    }
    write_all(store, &map)?;
    tracing::info!(itinerary_id = %id, "itinerary deleted");
    Ok(true)
}
