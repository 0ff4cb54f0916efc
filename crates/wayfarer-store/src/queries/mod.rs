pub mod itineraries;
pub mod settings;
