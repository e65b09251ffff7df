//! Detail screen for one chosen location.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lemon_store::{SavedLocationStore, StoreError};
use lemon_weather::forecast::{
    current_weather_details, day_forecasts, hourly_forecasts, next_hours,
    precipitation_probabilities, single_weather_details,
};
use lemon_weather::{
    Coordinates, DayForecast, SavedLocation, TemperatureUnit, WeatherApi, WeatherError,
};

use crate::app_services::AppServices;
use crate::services::summary_or_default;
use crate::state::WeatherDetailScreenUiState;

pub const DEFAULT_ERROR_MESSAGE: &str =
    "Oops! An error occurred when trying to fetch the weather details. Please try again.";

/// Entries kept for the precipitation and hourly lists
const DETAIL_HOURS: usize = 24;

/// Days returned by [`week_forecast`]
const WEEK_DAYS: i64 = 7;

type SharedState = Arc<watch::Sender<WeatherDetailScreenUiState>>;

pub struct WeatherDetailModel {
    location: SavedLocation,
    store: Arc<SavedLocationStore>,
    state: SharedState,
    unit: watch::Sender<TemperatureUnit>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WeatherDetailModel {
    /// Start loading `location`. Must be called inside a tokio runtime.
    pub fn start(services: AppServices, location: SavedLocation, unit: TemperatureUnit) -> Self {
        let state: SharedState = Arc::new(watch::channel(WeatherDetailScreenUiState::default()).0);
        let (unit_tx, unit_rx) = watch::channel(unit);
        let cancel = CancellationToken::new();

        let tracker = tokio::spawn(track_saved(
            services.saved_locations.subscribe(),
            location.name.clone(),
            state.clone(),
            cancel.clone(),
        ));
        let fetcher = tokio::spawn(run_fetch(
            services.clone(),
            location.clone(),
            state.clone(),
            unit_rx,
            cancel.clone(),
        ));

        tracing::info!("Detail model started for {}", location.name);
        Self {
            location,
            store: services.saved_locations,
            state,
            unit: unit_tx,
            cancel,
            tasks: Mutex::new(vec![tracker, fetcher]),
        }
    }

    pub fn location(&self) -> &SavedLocation {
        &self.location
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherDetailScreenUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherDetailScreenUiState {
        self.state.borrow().clone()
    }

    pub fn add_location_to_saved_locations(&self) -> Result<(), StoreError> {
        self.store.upsert(&self.location)
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.unit.send_if_modified(|current| {
            if *current == unit {
                return false;
            }
            *current = unit;
            true
        });
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Detail model task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for WeatherDetailModel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn track_saved(
    mut saved: watch::Receiver<Vec<SavedLocation>>,
    name: String,
    state: SharedState,
    cancel: CancellationToken,
) {
    loop {
        let is_saved = saved.borrow_and_update().iter().any(|l| l.name == name);
        state.send_if_modified(|s| {
            let changed = s.is_previously_saved_location != is_saved;
            s.is_previously_saved_location = is_saved;
            changed
        });

        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = saved.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

async fn run_fetch(
    services: AppServices,
    location: SavedLocation,
    state: SharedState,
    mut unit: watch::Receiver<TemperatureUnit>,
    cancel: CancellationToken,
) {
    loop {
        let current_unit = *unit.borrow_and_update();
        state.send_modify(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = load_details(&services, &location, current_unit, &state) => result,
        };

        if let Err(e) = result {
            tracing::warn!("Failed to load details for {}: {}", location.name, e);
            // Nothing from a failed or earlier load stays next to the error
            state.send_modify(|s| {
                *s = WeatherDetailScreenUiState {
                    is_loading: false,
                    is_previously_saved_location: s.is_previously_saved_location,
                    error_message: Some(DEFAULT_ERROR_MESSAGE.to_string()),
                    ..WeatherDetailScreenUiState::default()
                };
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = unit.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

async fn load_details(
    services: &AppServices,
    location: &SavedLocation,
    unit: TemperatureUnit,
    state: &SharedState,
) -> Result<(), WeatherError> {
    let coordinates = location.coordinates;
    let response = services.weather.current_weather(coordinates, unit).await?;
    let mut details = current_weather_details(&response, &location.name)?;
    details.coordinates = coordinates;

    state.send_modify(|s| {
        s.weather_details_of_chosen_location = Some(details.clone());
        s.is_weather_summary_text_loading = true;
    });
    let summary = summary_or_default(services.summary.as_ref(), &details, unit).await;
    state.send_modify(|s| {
        s.weather_summary_text = Some(summary);
        s.is_weather_summary_text_loading = false;
    });

    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    let (hourly, daily) = tokio::join!(
        services
            .weather
            .hourly_forecast(coordinates, today, tomorrow, unit),
        services.weather.daily_forecast(coordinates, today, today, unit),
    );
    let (hourly, daily) = (hourly?, daily?);

    let now = Local::now().naive_local();
    let precipitation: Vec<_> = precipitation_probabilities(&hourly, &Local)?
        .into_iter()
        .filter(|p| p.date_time >= now)
        .take(DETAIL_HOURS)
        .collect();
    let forecasts = next_hours(hourly_forecasts(&hourly, &Local)?, now, DETAIL_HOURS);
    let items = single_weather_details(&daily)?;

    state.send_modify(|s| {
        s.precipitation_probabilities = precipitation;
        s.hourly_forecasts = forecasts;
        s.additional_weather_info_items = items;
        s.is_loading = false;
    });
    Ok(())
}

/// Seven-day outlook starting at `today`.
pub async fn week_forecast(
    api: &dyn WeatherApi,
    coordinates: Coordinates,
    unit: TemperatureUnit,
    today: NaiveDate,
) -> Result<Vec<DayForecast>, WeatherError> {
    let end = today + ChronoDuration::days(WEEK_DAYS - 1);
    let response = api.daily_forecast(coordinates, today, end, unit).await?;
    day_forecasts(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{SummaryGenerator, TemplateSummary};
    use crate::testing::{FakeGeocoder, FakeLocation, FakePlaceSearch, FakeWeatherApi};
    use async_trait::async_trait;
    use lemon_weather::CurrentWeatherDetails;
    use std::time::Duration;

    struct SilentSummary;

    #[async_trait]
    impl SummaryGenerator for SilentSummary {
        async fn summarize(
            &self,
            _details: &CurrentWeatherDetails,
            _unit: TemperatureUnit,
        ) -> anyhow::Result<String> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn services(
        api: Arc<FakeWeatherApi>,
        store: Arc<SavedLocationStore>,
        summary: Arc<dyn SummaryGenerator>,
    ) -> AppServices {
        AppServices {
            weather: api,
            places: Arc::new(FakePlaceSearch::new()),
            geocoder: Arc::new(FakeGeocoder::named("unused")),
            location: Arc::new(FakeLocation(Ok(Coordinates::new(0.0, 0.0)))),
            saved_locations: store,
            summary,
        }
    }

    fn tokyo() -> SavedLocation {
        SavedLocation::new("Tokyo, Japan", Coordinates::new(35.68, 139.69))
    }

    async fn wait_for(
        rx: &mut watch::Receiver<WeatherDetailScreenUiState>,
        predicate: impl FnMut(&WeatherDetailScreenUiState) -> bool,
    ) -> WeatherDetailScreenUiState {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for state")
            .expect("state channel closed")
            .clone()
    }

    #[tokio::test]
    async fn test_loads_all_sections() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api.clone(), store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();

        let state = wait_for(&mut rx, |s| !s.is_loading).await;
        assert!(state.error_message.is_none());
        assert!(!state.is_weather_summary_text_loading);

        let details = state.weather_details_of_chosen_location.unwrap();
        assert_eq!(details.name_of_location, "Tokyo, Japan");
        assert_eq!(details.temperature_rounded, 36);
        assert_eq!(details.coordinates, tokyo().coordinates);

        assert!(state
            .weather_summary_text
            .unwrap()
            .starts_with("Clear sky in Tokyo, Japan"));
        assert_eq!(state.precipitation_probabilities.len(), 24);
        assert_eq!(state.hourly_forecasts.len(), 24);
        assert_eq!(state.additional_weather_info_items.len(), 8);
        assert_eq!(api.hourly_calls(), 1);
        assert_eq!(api.daily_calls(), 1);

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_summary_failure_uses_fallback_text() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api, store, Arc::new(SilentSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();

        let state = wait_for(&mut rx, |s| !s.is_loading).await;
        assert_eq!(
            state.weather_summary_text.as_deref(),
            Some(crate::services::SUMMARY_UNAVAILABLE)
        );
        assert!(state.error_message.is_none());

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_current_weather_failure_sets_error_message() {
        let api = Arc::new(FakeWeatherApi::new());
        api.fail_for(tokyo().coordinates);
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api.clone(), store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();

        let state = wait_for(&mut rx, |s| s.error_message.is_some()).await;
        assert_eq!(state.error_message.as_deref(), Some(DEFAULT_ERROR_MESSAGE));
        assert!(!state.is_loading);
        assert!(state.weather_details_of_chosen_location.is_none());
        assert_eq!(api.hourly_calls(), 0);

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_daily_failure_sets_error_message() {
        let api = Arc::new(FakeWeatherApi::new());
        api.set_daily_failing(true);
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api, store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();

        let state = wait_for(&mut rx, |s| s.error_message.is_some()).await;
        assert_eq!(state.error_message.as_deref(), Some(DEFAULT_ERROR_MESSAGE));
        assert!(state.additional_weather_info_items.is_empty());
        assert!(state.weather_details_of_chosen_location.is_none());
        assert!(state.weather_summary_text.is_none());

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_refetch_clears_previous_results() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        store.upsert(&tokyo()).unwrap();
        let model = WeatherDetailModel::start(
            services(api.clone(), store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();
        let loaded = wait_for(&mut rx, |s| !s.is_loading && s.is_previously_saved_location).await;
        assert_eq!(loaded.hourly_forecasts.len(), 24);

        api.set_hourly_failing(true);
        model.set_temperature_unit(TemperatureUnit::Fahrenheit);

        let state = wait_for(&mut rx, |s| s.error_message.is_some()).await;
        assert!(!state.is_loading);
        assert!(state.weather_details_of_chosen_location.is_none());
        assert!(state.weather_summary_text.is_none());
        assert!(state.hourly_forecasts.is_empty());
        assert!(state.precipitation_probabilities.is_empty());
        assert!(state.additional_weather_info_items.is_empty());
        assert!(state.is_previously_saved_location);

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_tracks_saved_state() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api, store.clone(), Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();
        wait_for(&mut rx, |s| !s.is_loading).await;
        assert!(!model.state().is_previously_saved_location);

        model.add_location_to_saved_locations().unwrap();
        wait_for(&mut rx, |s| s.is_previously_saved_location).await;
        assert!(store.contains("Tokyo, Japan").unwrap());

        store.remove("Tokyo, Japan").unwrap();
        wait_for(&mut rx, |s| !s.is_previously_saved_location).await;

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_already_saved_location_is_flagged() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        store.upsert(&tokyo()).unwrap();
        let model = WeatherDetailModel::start(
            services(api, store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();

        wait_for(&mut rx, |s| s.is_previously_saved_location).await;
        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_unit_change_refetches() {
        let api = Arc::new(FakeWeatherApi::new());
        let store = Arc::new(SavedLocationStore::in_memory().unwrap());
        let model = WeatherDetailModel::start(
            services(api.clone(), store, Arc::new(TemplateSummary)),
            tokyo(),
            TemperatureUnit::Celsius,
        );
        let mut rx = model.subscribe();
        wait_for(&mut rx, |s| !s.is_loading).await;

        model.set_temperature_unit(TemperatureUnit::Fahrenheit);
        tokio::time::timeout(Duration::from_secs(5), async {
            while api.daily_calls() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(api.current_calls(), 2);
        assert_eq!(api.last_unit(), Some(TemperatureUnit::Fahrenheit));

        model.shutdown().await;
    }

    #[tokio::test]
    async fn test_week_forecast_covers_seven_days() {
        let api = FakeWeatherApi::new();
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let days = week_forecast(
            &api,
            Coordinates::new(52.52, 13.40),
            TemperatureUnit::Celsius,
            today,
        )
        .await
        .unwrap();

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, today);
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert_eq!(days[0].high, 11.0);
        assert_eq!(days[0].low, 3.0);
    }
}
