//! Local persistence for Lemon.

pub mod error;
pub mod saved_locations;

pub use error::StoreError;
pub use saved_locations::SavedLocationStore;
