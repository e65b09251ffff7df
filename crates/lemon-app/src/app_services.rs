//! Shared collaborators for the view models.
//!
//! Built once from the loaded configuration; tests assemble one from fakes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lemon_core::{Config, TemperatureUnit, WeatherConfig};
use lemon_store::SavedLocationStore;
use lemon_weather::{
    ConfiguredLocationProvider, CurrentLocationProvider, NominatimGeocoder, OpenMeteoClient,
    OpenMeteoGeocoder, PlaceSearch, ReverseGeocoder, WeatherApi,
};

use crate::services::{SummaryGenerator, TemplateSummary};

#[derive(Clone)]
pub struct AppServices {
    pub weather: Arc<dyn WeatherApi>,
    pub places: Arc<dyn PlaceSearch>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub location: Arc<dyn CurrentLocationProvider>,
    pub saved_locations: Arc<SavedLocationStore>,
    pub summary: Arc<dyn SummaryGenerator>,
}

impl AppServices {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let weather = OpenMeteoClient::new(&config.weather, &config.retry)
            .context("Failed to create forecast client")?;
        let places =
            OpenMeteoGeocoder::new(&config.weather).context("Failed to create place search")?;
        let geocoder = NominatimGeocoder::new(&config.weather)
            .context("Failed to create reverse geocoder")?;
        let store = SavedLocationStore::new(config.database_path())
            .context("Failed to open saved locations")?;

        tracing::info!("Services initialized");
        Ok(Self {
            weather: Arc::new(weather),
            places: Arc::new(places),
            geocoder: Arc::new(geocoder),
            location: Arc::new(ConfiguredLocationProvider::new(&config.location)),
            saved_locations: Arc::new(store),
            summary: Arc::new(TemplateSummary),
        })
    }
}

/// Tunables shared by the view models.
#[derive(Debug, Clone, Copy)]
pub struct ModelSettings {
    pub temperature_unit: TemperatureUnit,
    pub suggestion_debounce: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

impl From<&WeatherConfig> for ModelSettings {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            temperature_unit: config.temperature_unit,
            suggestion_debounce: Duration::from_millis(config.suggestion_debounce_ms),
            max_concurrent_fetches: config.max_concurrent_fetches,
        }
    }
}
