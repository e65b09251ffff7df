//! Home screen: saved locations, current location and place search.
//!
//! Three background tasks feed one `watch` channel of [`HomeScreenUiState`]:
//!
//! - the saved-locations loop reconciles the weather cache whenever the
//!   saved list or temperature unit changes, or a retry is requested;
//! - the suggestions loop debounces the search query, skips repeats and
//!   abandons an in-flight search when a newer query arrives;
//! - a one-shot task loads the current location on request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lemon_core::AppError;
use lemon_weather::forecast::{current_weather_details, hourly_forecasts, next_hours};
use lemon_weather::{
    BriefWeatherDetails, HourlyForecast, PlaceSearch, SavedLocation, TemperatureUnit, WeatherError,
};

use crate::app_services::{AppServices, ModelSettings};
use crate::cache::LocationWeatherCache;
use crate::state::HomeScreenUiState;

/// Hourly entries shown for the current location
const HOURLY_FORECAST_HOURS: usize = 24;

type SharedState = Arc<watch::Sender<HomeScreenUiState>>;

pub struct HomeModel {
    services: AppServices,
    state: SharedState,
    query: watch::Sender<String>,
    unit: Arc<watch::Sender<TemperatureUnit>>,
    retrying: Arc<AtomicBool>,
    retry_requested: Arc<Notify>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HomeModel {
    /// Start the background loops. Must be called inside a tokio runtime.
    pub fn start(services: AppServices, settings: ModelSettings) -> Self {
        let initial = HomeScreenUiState {
            is_loading_saved_locations: true,
            ..HomeScreenUiState::default()
        };
        let state: SharedState = Arc::new(watch::channel(initial).0);
        let (query, query_rx) = watch::channel(String::new());
        let unit = Arc::new(watch::channel(settings.temperature_unit).0);
        let retrying = Arc::new(AtomicBool::new(false));
        let retry_requested = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let saved_loop = tokio::spawn(run_saved_locations(SavedLocationsLoop {
            services: services.clone(),
            state: state.clone(),
            saved: services.saved_locations.subscribe(),
            unit: unit.subscribe(),
            cache: LocationWeatherCache::new(
                settings.temperature_unit,
                settings.max_concurrent_fetches,
            ),
            retrying: retrying.clone(),
            retry_requested: retry_requested.clone(),
            cancel: cancel.clone(),
        }));

        let suggestions_loop = tokio::spawn(run_suggestions(
            services.places.clone(),
            state.clone(),
            query_rx,
            settings.suggestion_debounce,
            cancel.clone(),
        ));

        tracing::info!("Home model started");
        Self {
            services,
            state,
            query,
            unit,
            retrying,
            retry_requested,
            cancel,
            tasks: Mutex::new(vec![saved_loop, suggestions_loop]),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeScreenUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> HomeScreenUiState {
        self.state.borrow().clone()
    }

    /// Ask the saved-locations loop for another pass. Ignored while one is pending.
    pub fn retry_fetching_saved_locations(&self) {
        if self.retrying.swap(true, Ordering::SeqCst) {
            tracing::debug!("Retry already in progress");
            return;
        }
        self.retry_requested.notify_one();
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.query.send_replace(query.into());
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        *self.unit.borrow()
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

    /// Load weather for the device location. The loading flag is set before
    /// this returns; the handle completes once the state has been updated.
    pub fn fetch_weather_for_current_location(&self) -> JoinHandle<()> {
        self.state.send_modify(|s| {
            s.is_loading_weather_details_of_current_location = true;
            s.error_fetching_weather_for_current_location = false;
        });

        let services = self.services.clone();
        let state = self.state.clone();
        let unit = self.temperature_unit();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = load_current_location(&services, unit) => result,
            };

            match result {
                Ok((brief, hourly)) => state.send_modify(|s| {
                    s.is_loading_weather_details_of_current_location = false;
                    s.error_fetching_weather_for_current_location = false;
                    s.weather_details_of_current_location = Some(brief);
                    s.hourly_forecasts_for_current_location = hourly;
                }),
                Err(e) => {
                    tracing::warn!("Failed to load weather for current location: {}", e);
                    state.send_modify(|s| {
                        s.is_loading_weather_details_of_current_location = false;
                        s.error_fetching_weather_for_current_location = true;
                    });
                }
            }
        })
    }

    /// Stop the background loops and wait for them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Home model task ended abnormally: {}", e);
            }
        }
        tracing::info!("Home model stopped");
    }
}

impl Drop for HomeModel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SavedLocationsLoop {
    services: AppServices,
    state: SharedState,
    saved: watch::Receiver<Vec<SavedLocation>>,
    unit: watch::Receiver<TemperatureUnit>,
    cache: LocationWeatherCache,
    retrying: Arc<AtomicBool>,
    retry_requested: Arc<Notify>,
    cancel: CancellationToken,
}

async fn run_saved_locations(mut ctx: SavedLocationsLoop) {
    loop {
        let saved = ctx.saved.borrow_and_update().clone();
        ctx.cache.set_unit(*ctx.unit.borrow_and_update());

        ctx.state.send_modify(|s| {
            s.is_loading_saved_locations = true;
            s.error_fetching_weather_for_saved_locations = false;
        });

        let result = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            result = ctx.cache.reconcile(ctx.services.weather.as_ref(), &saved) => result,
        };

        let briefs = result.map_err(|e| {
            let detail = e.to_string();
            let error = AppError::from(e);
            tracing::warn!("{} ({})", error.user_message(), detail);
            error
        });
        ctx.state.send_modify(|s| {
            s.is_loading_saved_locations = false;
            s.error_fetching_weather_for_saved_locations = briefs.is_err();
            s.weather_details_of_saved_locations = briefs.unwrap_or_default();
        });
        ctx.retrying.store(false, Ordering::SeqCst);

        tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            changed = ctx.saved.changed() => {
                if changed.is_err() {
                    tracing::debug!("Saved locations store closed");
                    return;
                }
            }
            changed = ctx.unit.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = ctx.retry_requested.notified() => {
                tracing::debug!("Retrying saved locations");
            }
        }
    }
}

async fn run_suggestions(
    search: Arc<dyn PlaceSearch>,
    state: SharedState,
    mut query: watch::Receiver<String>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut last_query = query.borrow_and_update().clone();
    let mut in_flight: Option<JoinHandle<()>> = None;

    'outer: loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = query.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Wait for the query to settle
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break 'outer,
                _ = tokio::time::sleep(debounce) => break,
                changed = query.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                }
            }
        }

        let current = query.borrow_and_update().clone();
        if current == last_query {
            continue;
        }
        last_query = current.clone();

        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        in_flight = Some(tokio::spawn(search_suggestions(
            search.clone(),
            state.clone(),
            current,
        )));
    }

    if let Some(task) = in_flight {
        task.abort();
    }
}

async fn search_suggestions(search: Arc<dyn PlaceSearch>, state: SharedState, query: String) {
    if query.trim().is_empty() {
        state.send_modify(|s| {
            s.is_loading_autofill_suggestions = false;
            s.error_fetching_autofill_suggestions = false;
            s.autofill_suggestions = Vec::new();
            s.suggestions_query = query;
        });
        return;
    }

    state.send_modify(|s| {
        s.is_loading_autofill_suggestions = true;
        s.error_fetching_autofill_suggestions = false;
    });

    let result = search.suggestions(&query).await;

    state.send_modify(|s| {
        s.is_loading_autofill_suggestions = false;
        match result {
            Ok(suggestions) => {
                s.autofill_suggestions = suggestions;
                s.error_fetching_autofill_suggestions = false;
            }
            Err(ref e) => {
                tracing::warn!("Place search for {:?} failed: {}", query, e);
                s.autofill_suggestions = Vec::new();
                s.error_fetching_autofill_suggestions = true;
            }
        }
        s.suggestions_query = query;
    });
}

async fn load_current_location(
    services: &AppServices,
    unit: TemperatureUnit,
) -> Result<(BriefWeatherDetails, Option<Vec<HourlyForecast>>), WeatherError> {
    let coordinates = services.location.current_location().await?;
    let name = services.geocoder.location_name(coordinates).await?;

    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    let (current, hourly) = tokio::join!(
        services.weather.current_weather(coordinates, unit),
        services
            .weather
            .hourly_forecast(coordinates, today, tomorrow, unit),
    );

    let mut details = current_weather_details(&current?, &name)?;
    details.coordinates = coordinates;

    let hourly = match hourly.and_then(|response| hourly_forecasts(&response, &Local)) {
        Ok(forecasts) => Some(next_hours(
            forecasts,
            Local::now().naive_local(),
            HOURLY_FORECAST_HOURS,
        )),
        Err(e) => {
            tracing::debug!("Hourly forecast unavailable: {}", e);
            None
        }
    };

    Ok((details.to_brief(), hourly))
}
