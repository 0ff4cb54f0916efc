//! Integration tests for the on-disk store and the itinerary queries.
//!
//! Each test works in its own temporary data directory.

use std::fs;

use wayfarer_store::StoreError;
use wayfarer_store::kv::{FileStore, KeyValueStore};
use wayfarer_store::models::Locale;
use wayfarer_store::queries::itineraries::{self, ITINERARIES_KEY, LoadError};
use wayfarer_store::queries::settings;
use wayfarer_test_utils::{TempStore, sample_itinerary};

#[test]
fn save_then_load_round_trips_through_disk() {
    let tmp = TempStore::new();
    let saved = itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();
    let id = saved.id.clone().unwrap();

    // A fresh handle on the same file sees the same data.
    let reopened = FileStore::open(&tmp.config);
    let loaded = itineraries::get_itinerary(&reopened, &id).unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn persisted_blob_uses_camel_case_wire_names() {
    let tmp = TempStore::new();
    itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();

    let blob = tmp.store.get(ITINERARIES_KEY).unwrap().unwrap();
    assert!(blob.contains("\"tripTitle\""));
    assert!(blob.contains("\"estimatedCost\""));
    assert!(blob.contains("\"suggestedCompanies\""));
    assert!(blob.contains("\"tripRequirements\""));
}

#[test]
fn second_save_overwrites_single_entry() {
    let tmp = TempStore::new();
    let first = itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();
    let mut edited = first.clone();
    edited.trip_title = "Lisbon, again".into();
    let second = itineraries::save_itinerary(tmp.store.as_ref(), &edited).unwrap();

    assert_eq!(first.id, second.id);
    let all = itineraries::list_itineraries(tmp.store.as_ref()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].trip_title, "Lisbon, again");
}

#[test]
fn load_distinguishes_empty_store_from_missing_id() {
    let tmp = TempStore::new();
    assert!(matches!(
        itineraries::get_itinerary(tmp.store.as_ref(), "abc"),
        Err(LoadError::NoSavedPlans)
    ));

    itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();
    assert!(matches!(
        itineraries::get_itinerary(tmp.store.as_ref(), "abc"),
        Err(LoadError::NotFound { .. })
    ));
}

#[test]
fn corrupt_file_is_reported_not_overwritten() {
    let tmp = TempStore::new();
    fs::create_dir_all(tmp.config.data_dir()).unwrap();
    fs::write(tmp.config.store_path(), "{ this is not json").unwrap();

    assert!(matches!(
        itineraries::get_itinerary(tmp.store.as_ref(), "abc"),
        Err(LoadError::Unreadable(StoreError::CorruptFile { .. }))
    ));
    let err = itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap_err();
    assert!(err.is_corrupt());
    assert_eq!(
        fs::read_to_string(tmp.config.store_path()).unwrap(),
        "{ this is not json"
    );
}

#[test]
fn settings_share_the_file_with_itineraries() {
    let tmp = TempStore::new();
    settings::set_api_key(tmp.store.as_ref(), "key-1").unwrap();
    settings::set_locale(tmp.store.as_ref(), Locale::Ar).unwrap();
    itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();

    let reopened = FileStore::open(&tmp.config);
    assert_eq!(settings::get_api_key(&reopened).unwrap().as_deref(), Some("key-1"));
    assert_eq!(settings::get_locale(&reopened).unwrap(), Locale::Ar);

    settings::clear_api_key(&reopened).unwrap();
    assert_eq!(settings::get_api_key(tmp.store.as_ref()).unwrap(), None);
    assert_eq!(itineraries::list_itineraries(&reopened).unwrap().len(), 1);
}

#[test]
fn delete_removes_only_the_named_plan() {
    let tmp = TempStore::new();
    let a = itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();
    let b = itineraries::save_itinerary(tmp.store.as_ref(), &sample_itinerary()).unwrap();
    assert_ne!(a.id, b.id);

    assert!(itineraries::delete_itinerary(tmp.store.as_ref(), a.id.as_deref().unwrap()).unwrap());
    let remaining = itineraries::list_itineraries(tmp.store.as_ref()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b.id);
}
