//! Notification content for weather updates and severe-weather alerts.
//! Delivery is left to the front end.

use lemon_weather::{is_severe, CurrentWeatherDetails, TemperatureUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherNotification {
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    /// Stays visible until replaced
    pub ongoing: bool,
    /// Dismissed when tapped
    pub auto_cancel: bool,
}

/// The persistent "current conditions" notification.
pub fn status_notification(
    details: &CurrentWeatherDetails,
    unit: TemperatureUnit,
) -> WeatherNotification {
    WeatherNotification {
        title: format!("{} Weather Update", details.name_of_location),
        body: format!(
            "Temp: {}{}, {}.",
            details.temperature_rounded,
            unit.symbol(),
            details.weather_condition
        ),
        priority: NotificationPriority::Low,
        ongoing: true,
        auto_cancel: false,
    }
}

/// An alert, only for severe weather codes.
pub fn severe_weather_alert(details: &CurrentWeatherDetails) -> Option<WeatherNotification> {
    if !is_severe(details.weather_code) {
        return None;
    }

    tracing::info!(
        "Severe weather at {}: {}",
        details.name_of_location,
        details.weather_condition
    );
    Some(WeatherNotification {
        title: "Weather Alert".to_string(),
        body: format!("Alert: {}", details.weather_condition),
        priority: NotificationPriority::High,
        ongoing: false,
        auto_cancel: true,
    })
}
