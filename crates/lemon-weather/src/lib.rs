//! Weather data for Lemon
//!
//! Open-Meteo forecast and geocoding clients, Nominatim reverse geocoding,
//! and the mapping from raw responses to the domain types shown on screen.

pub mod condition;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod response;
pub mod retry;
pub mod types;

pub use condition::{describe_code, icon_for_code, image_for_code, is_severe, WeatherCondition};
pub use geocode::{NominatimGeocoder, OpenMeteoGeocoder, PlaceSearch, ReverseGeocoder};
pub use location::{ConfiguredLocationProvider, CurrentLocationProvider};
pub use provider::{OpenMeteoClient, WeatherApi};
pub use retry::RetryConfig;
pub use types::*;
