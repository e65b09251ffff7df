pub mod alert_service;
pub mod summary_service;

pub use alert_service::{
    severe_weather_alert, status_notification, NotificationPriority, WeatherNotification,
};
pub use summary_service::{summary_or_default, SummaryGenerator, TemplateSummary, SUMMARY_UNAVAILABLE};
