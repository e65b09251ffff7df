//! In-memory collaborators for model tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use lemon_weather::response::{
    CurrentWeatherBlock, CurrentWeatherResponse, DailyBlock, DailyWeatherResponse, HourlyBlock,
    HourlyWeatherResponse,
};
use lemon_weather::{
    Coordinates, CurrentLocationProvider, LocationAutofillSuggestion, LocationError, PlaceSearch,
    ReverseGeocoder, TemperatureUnit, WeatherApi, WeatherError,
};

fn unavailable(url: &str) -> WeatherError {
    WeatherError::Status {
        status: 503,
        url: url.to_string(),
    }
}

/// Weather source whose current temperature equals the requested latitude.
#[derive(Default)]
pub struct FakeWeatherApi {
    calls: Mutex<HashMap<Coordinates, usize>>,
    failing: Mutex<HashSet<Coordinates>>,
    codes: Mutex<HashMap<Coordinates, i32>>,
    last_unit: Mutex<Option<TemperatureUnit>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hourly_calls: AtomicUsize,
    daily_calls: AtomicUsize,
    fail_hourly: Mutex<bool>,
    fail_daily: Mutex<bool>,
    delay: Duration,
}

impl FakeWeatherApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn fail_for(&self, coordinates: Coordinates) {
        self.failing.lock().insert(coordinates);
    }

    pub fn recover(&self, coordinates: Coordinates) {
        self.failing.lock().remove(&coordinates);
    }

    pub fn set_code(&self, coordinates: Coordinates, code: i32) {
        self.codes.lock().insert(coordinates, code);
    }

    pub fn set_hourly_failing(&self, failing: bool) {
        *self.fail_hourly.lock() = failing;
    }

    pub fn set_daily_failing(&self, failing: bool) {
        *self.fail_daily.lock() = failing;
    }

    pub fn current_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn calls_for(&self, coordinates: Coordinates) -> usize {
        self.calls.lock().get(&coordinates).copied().unwrap_or(0)
    }

    pub fn hourly_calls(&self) -> usize {
        self.hourly_calls.load(Ordering::SeqCst)
    }

    pub fn daily_calls(&self) -> usize {
        self.daily_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_unit(&self) -> Option<TemperatureUnit> {
        *self.last_unit.lock()
    }
}

#[async_trait]
impl WeatherApi for FakeWeatherApi {
    async fn current_weather(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeatherResponse, WeatherError> {
        *self.calls.lock().entry(coordinates).or_default() += 1;
        *self.last_unit.lock() = Some(unit);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(&coordinates) {
            return Err(unavailable("current"));
        }

        let code = self.codes.lock().get(&coordinates).copied().unwrap_or(0);
        Ok(CurrentWeatherResponse {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            current_weather: CurrentWeatherBlock {
                temperature: coordinates.latitude,
                windspeed: None,
                winddirection: None,
                weathercode: code,
                is_day: 1,
            },
        })
    }

    /// 48 hours starting two hours before the current hour
    async fn hourly_forecast(
        &self,
        coordinates: Coordinates,
        _start: NaiveDate,
        _end: NaiveDate,
        _unit: TemperatureUnit,
    ) -> Result<HourlyWeatherResponse, WeatherError> {
        self.hourly_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_hourly.lock() {
            return Err(unavailable("hourly"));
        }

        let now = Utc::now().timestamp();
        let first = now - now.rem_euclid(3600) - 2 * 3600;
        Ok(HourlyWeatherResponse {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            utc_offset_seconds: 0,
            hourly: HourlyBlock {
                time: (0..48).map(|h| first + h * 3600).collect(),
                weathercode: vec![Some(2); 48],
                precipitation_probability: (0..48).map(|h| Some((h % 10) * 10)).collect(),
                temperature_2m: vec![Some(coordinates.latitude); 48],
            },
        })
    }

    async fn daily_forecast(
        &self,
        _coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        _unit: TemperatureUnit,
    ) -> Result<DailyWeatherResponse, WeatherError> {
        self.daily_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_daily.lock() {
            return Err(unavailable("daily"));
        }

        let days = (end - start).num_days().max(0) as usize + 1;
        let midnight = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let day_starts: Vec<i64> = (0..days as i64).map(|d| midnight + d * 86_400).collect();

        Ok(DailyWeatherResponse {
            timezone: "GMT".into(),
            utc_offset_seconds: 0,
            daily: DailyBlock {
                time: day_starts.clone(),
                temperature_2m_min: vec![Some(3.0); days],
                temperature_2m_max: vec![Some(11.0); days],
                apparent_temperature_min: vec![Some(1.0); days],
                apparent_temperature_max: vec![Some(9.0); days],
                sunrise: day_starts.iter().map(|t| t + 6 * 3600).collect(),
                sunset: day_starts.iter().map(|t| t + 18 * 3600).collect(),
                uv_index_max: vec![Some(3.0); days],
                winddirection_10m_dominant: vec![Some(180); days],
                windspeed_10m_max: vec![Some(12.0); days],
                weathercode: vec![Some(3); days],
                precipitation_probability_max: vec![Some(20); days],
            },
        })
    }
}

/// Place search that records queries and echoes each one back as a suggestion.
#[derive(Default)]
pub struct FakePlaceSearch {
    queries: Mutex<Vec<String>>,
    failing: Mutex<bool>,
    delay: Duration,
}

impl FakePlaceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl PlaceSearch for FakePlaceSearch {
    async fn suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<LocationAutofillSuggestion>, WeatherError> {
        self.queries.lock().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if *self.failing.lock() {
            return Err(WeatherError::Geocode("search unavailable".into()));
        }

        Ok(vec![LocationAutofillSuggestion {
            id: format!("id-{}", query),
            name: query.to_string(),
            address: "State, Country".into(),
            coordinates: Coordinates::new(12.0, 34.0),
            country_flag_url: "https://open-meteo.com/images/country-flags/xx.svg".into(),
        }])
    }
}

pub struct FakeGeocoder {
    name: Option<String>,
}

impl FakeGeocoder {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { name: None }
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn location_name(&self, coordinates: Coordinates) -> Result<String, LocationError> {
        self.name
            .clone()
            .ok_or_else(|| LocationError::NameUnavailable(coordinates.to_string()))
    }
}

pub struct FakeLocation(pub Result<Coordinates, LocationError>);

#[async_trait]
impl CurrentLocationProvider for FakeLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.0.clone()
    }
}
