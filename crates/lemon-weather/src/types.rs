use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::hash::{Hash, Hasher};

pub use lemon_core::{LocationError, TemperatureUnit};

use crate::condition::WeatherCondition;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    // -0.0 and 0.0 must compare and hash the same
    fn key(&self) -> (u64, u64) {
        ((self.latitude + 0.0).to_bits(), (self.longitude + 0.0).to_bits())
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A location the user chose to keep on the home screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SavedLocation {
    pub name: String,
    pub coordinates: Coordinates,
}

impl SavedLocation {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }
}

/// Current conditions at a named location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeatherDetails {
    pub name_of_location: String,
    pub temperature_rounded: i32,
    pub weather_code: i32,
    pub weather_condition: &'static str,
    pub is_day: bool,
    pub icon: &'static str,
    pub image: &'static str,
    pub coordinates: Coordinates,
}

impl CurrentWeatherDetails {
    pub fn to_brief(&self) -> BriefWeatherDetails {
        BriefWeatherDetails {
            name_of_location: self.name_of_location.clone(),
            current_temperature_rounded: self.temperature_rounded,
            short_description: self.weather_condition,
            short_description_icon: self.icon,
            coordinates: self.coordinates,
        }
    }
}

/// Condensed current conditions, as listed for saved locations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefWeatherDetails {
    pub name_of_location: String,
    pub current_temperature_rounded: i32,
    pub short_description: &'static str,
    pub short_description_icon: &'static str,
    pub coordinates: Coordinates,
}

/// One hour of forecast in local time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    pub date_time: NaiveDateTime,
    pub weather_icon: &'static str,
    pub temperature: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationProbability {
    pub latitude: f64,
    pub longitude: f64,
    pub date_time: NaiveDateTime,
    pub probability_percentage: u8,
}

/// A labelled value on the detail screen ("Sunrise", "06 : 12 AM")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleWeatherDetail {
    pub name: &'static str,
    pub value: String,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAutofillSuggestion {
    pub id: String,
    pub name: String,
    /// "state, country"
    pub address: String,
    pub coordinates: Coordinates,
    pub country_flag_url: String,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: WeatherCondition,
    pub precipitation_chance: u8,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Geocoding error: {0}")]
    Geocode(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown weather code {0}")]
    UnknownWeatherCode(i32),
}
