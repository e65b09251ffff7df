//! Weather cache for the user's saved locations.
//!
//! `reconcile` brings the cache in line with the current saved list: entries
//! for removed locations are evicted, and only locations with no entry are
//! fetched, several at a time. Successful fetches are kept even when others
//! fail, so a retry only asks for what is still missing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use futures::stream::{self, StreamExt};

use lemon_weather::forecast::current_weather_details;
use lemon_weather::{
    BriefWeatherDetails, CurrentWeatherDetails, SavedLocation, TemperatureUnit, WeatherApi,
    WeatherError,
};

/// A saved location whose weather could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    pub location: SavedLocation,
    pub error: WeatherError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location.name, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("weather unavailable for {} of {requested} saved locations ({})", .failures.len(), join_failures(.failures))]
pub struct ReconcileError {
    /// Failed locations, in saved-list order
    pub failures: Vec<FetchFailure>,
    /// Number of distinct saved locations in the request
    pub requested: usize,
}

impl ReconcileError {
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.location.name.as_str())
            .collect()
    }
}

fn join_failures(failures: &[FetchFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct LocationWeatherCache {
    entries: HashMap<SavedLocation, CurrentWeatherDetails>,
    unit: TemperatureUnit,
    max_concurrent_fetches: usize,
}

impl LocationWeatherCache {
    pub fn new(unit: TemperatureUnit, max_concurrent_fetches: usize) -> Self {
        Self {
            entries: HashMap::new(),
            unit,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Cached temperatures are in the old unit, so a change empties the cache.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        if unit != self.unit {
            tracing::debug!("Temperature unit changed to {}, clearing cache", unit);
            self.unit = unit;
            self.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, location: &SavedLocation) -> bool {
        self.entries.contains_key(location)
    }

    pub fn get(&self, location: &SavedLocation) -> Option<&CurrentWeatherDetails> {
        self.entries.get(location)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reconcile against `saved` and return brief details in saved-list order.
    ///
    /// Duplicate entries in `saved` are reported once.
    pub async fn reconcile(
        &mut self,
        api: &dyn WeatherApi,
        saved: &[SavedLocation],
    ) -> Result<Vec<BriefWeatherDetails>, ReconcileError> {
        let mut seen = HashSet::with_capacity(saved.len());
        let ordered: Vec<&SavedLocation> = saved.iter().filter(|l| seen.insert(*l)).collect();

        let before = self.entries.len();
        self.entries.retain(|location, _| seen.contains(location));
        let evicted = before - self.entries.len();

        let misses: Vec<SavedLocation> = ordered
            .iter()
            .filter(|l| !self.entries.contains_key(*l))
            .map(|l| (*l).clone())
            .collect();

        tracing::debug!(
            "Reconciling {} saved locations: {} evicted, {} to fetch",
            ordered.len(),
            evicted,
            misses.len()
        );

        let mut failures = Vec::new();
        if !misses.is_empty() {
            let unit = self.unit;
            let results: Vec<_> = stream::iter(misses)
                .map(|location| async move {
                    let result = fetch_details(api, &location, unit).await;
                    (location, result)
                })
                .buffer_unordered(self.max_concurrent_fetches)
                .collect()
                .await;

            for (location, result) in results {
                match result {
                    Ok(details) => {
                        self.entries.insert(location, details);
                    }
                    Err(error) => {
                        tracing::warn!("Failed to fetch weather for {}: {}", location.name, error);
                        failures.push(FetchFailure { location, error });
                    }
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| ordered.iter().position(|l| **l == f.location));
            return Err(ReconcileError {
                failures,
                requested: ordered.len(),
            });
        }

        Ok(ordered
            .iter()
            .filter_map(|l| self.entries.get(*l))
            .map(CurrentWeatherDetails::to_brief)
            .collect())
    }
}

async fn fetch_details(
    api: &dyn WeatherApi,
    location: &SavedLocation,
    unit: TemperatureUnit,
) -> Result<CurrentWeatherDetails, WeatherError> {
    let response = api.current_weather(location.coordinates, unit).await?;
    let mut details = current_weather_details(&response, &location.name)?;
    // Keep the saved coordinates rather than the API's snapped grid point
    details.coordinates = location.coordinates;
    Ok(details)
}
