//! Local persistence for wayfarer: the data model, the key-value backends,
//! and the query functions over the stored keys.

pub mod config;
pub mod error;
pub mod kv;
pub mod models;
pub mod queries;

pub use error::StoreError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
