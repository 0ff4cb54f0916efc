//! Query functions for the stored credential and locale preference.
//!
//! Settings never block startup: a store file that cannot be decoded reads
//! as "nothing stored", and writing a setting moves such a file aside first.
//! Itinerary saves keep reporting the corrupt file instead.

use tracing::warn;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::models::Locale;

/// Storage key holding the AI service API key.
pub const API_KEY_KEY: &str = "gemini-api-key";

/// Storage key holding the preferred locale.
pub const LOCALE_KEY: &str = "locale";

/// Read the stored API key. Blank values count as absent.
pub fn get_api_key(store: &dyn KeyValueStore) -> Result<Option<String>, StoreError> {
    Ok(read_setting(store, API_KEY_KEY)?.filter(|k| !k.trim().is_empty()))
}

pub fn set_api_key(store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
    write_setting(store, API_KEY_KEY, key)
}

pub fn clear_api_key(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    match store.remove(API_KEY_KEY) {
        Err(e @ StoreError::CorruptFile { .. }) => {
            warn!(error = %e, "store file unreadable, no API key to remove");
            Ok(())
        }
        other => other,
    }
}

/// Read the preferred locale, defaulting to English when unset or
/// unrecognized.
pub fn get_locale(store: &dyn KeyValueStore) -> Result<Locale, StoreError> {
    Ok(read_setting(store, LOCALE_KEY)?
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

pub fn set_locale(store: &dyn KeyValueStore, locale: Locale) -> Result<(), StoreError> {
    write_setting(store, LOCALE_KEY, &locale.to_string())
}

fn read_setting(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>, StoreError> {
    match store.get(key) {
        Err(e @ StoreError::CorruptFile { .. }) => {
            warn!(key, error = %e, "store file unreadable, treating setting as unset");
            Ok(None)
        }
        other => other,
    }
}

fn write_setting(store: &dyn KeyValueStore, key: &str, value: &str) -> Result<(), StoreError> {
    match store.set(key, value) {
        Err(StoreError::CorruptFile { .. }) => {
            store.set_aside()?;
            store.set(key, value)
        }
        other => other,
    }
}
