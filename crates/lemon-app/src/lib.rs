//! View models and services for the Lemon weather app.
//!
//! The front end owns an [`AppServices`], starts a [`HomeModel`] and opens a
//! [`WeatherDetailModel`] per chosen location. Both publish screen state
//! through `tokio::sync::watch` channels.

pub mod app_services;
pub mod cache;
pub mod error_mapping;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

pub use app_services::{AppServices, ModelSettings};
pub use cache::{FetchFailure, LocationWeatherCache, ReconcileError};
pub use error_mapping::IntoAppError;
pub use models::{week_forecast, HomeModel, WeatherDetailModel, DEFAULT_ERROR_MESSAGE};
pub use services::{
    severe_weather_alert, status_notification, summary_or_default, NotificationPriority,
    SummaryGenerator, TemplateSummary, WeatherNotification, SUMMARY_UNAVAILABLE,
};
pub use state::{HomeScreenUiState, WeatherDetailScreenUiState};
