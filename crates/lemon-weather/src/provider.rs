//! Open-Meteo forecast client.

use async_trait::async_trait;
use chrono::NaiveDate;
use lemon_core::{RetrySettings, WeatherConfig};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

use crate::response::{
    CurrentWeatherResponse, DailyWeatherResponse, HourlyWeatherResponse, DAILY_VARIABLES,
    HOURLY_VARIABLES,
};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{Coordinates, TemperatureUnit, WeatherError};

const USER_AGENT: &str = concat!("Lemon/", env!("CARGO_PKG_VERSION"));

/// Source of forecast data.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Conditions right now at `coordinates`.
    async fn current_weather(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeatherResponse, WeatherError>;

    /// Hourly code, precipitation chance and temperature for `start..=end`.
    async fn hourly_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        unit: TemperatureUnit,
    ) -> Result<HourlyWeatherResponse, WeatherError>;

    /// Daily aggregates for `start..=end`, in the location's own timezone.
    async fn daily_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        unit: TemperatureUnit,
    ) -> Result<DailyWeatherResponse, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    windspeed_unit: String,
    precipitation_unit: String,
    retry: RetryConfig,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig, retry: &RetrySettings) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.forecast_api_url.trim_end_matches('/').to_string(),
            windspeed_unit: config.windspeed_unit.clone(),
            precipitation_unit: config.precipitation_unit.clone(),
            retry: RetryConfig::from(retry),
        })
    }

    /// Client against an arbitrary base URL with default units and no retries
    pub fn with_base_url(base_url: &str) -> Self {
        let defaults = WeatherConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            windspeed_unit: defaults.windspeed_unit,
            precipitation_unit: defaults.precipitation_unit,
            retry: RetryConfig::none(),
        }
    }

    async fn get_forecast<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/forecast", self.base_url);

        let response =
            with_retry(&self.retry, || self.client.get(&url).query(params).send()).await?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            tracing::warn!("Forecast request failed with status {}: {}", status, url);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("forecast response: {}", e)))
    }
}

fn coordinate_params(coordinates: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", coordinates.latitude.to_string()),
        ("longitude", coordinates.longitude.to_string()),
    ]
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    #[instrument(skip(self), level = "debug")]
    async fn current_weather(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeatherResponse, WeatherError> {
        let mut params = coordinate_params(coordinates);
        params.extend([
            ("temperature_unit", unit.unit_name().to_string()),
            ("windspeed_unit", self.windspeed_unit.clone()),
            ("precipitation_unit", self.precipitation_unit.clone()),
            ("current_weather", "true".to_string()),
        ]);

        self.get_forecast(&params).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn hourly_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        unit: TemperatureUnit,
    ) -> Result<HourlyWeatherResponse, WeatherError> {
        let mut params = coordinate_params(coordinates);
        params.extend([
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("timezone", "auto".to_string()),
            ("temperature_unit", unit.unit_name().to_string()),
            ("precipitation_unit", self.precipitation_unit.clone()),
            ("timeformat", "unixtime".to_string()),
            ("hourly", HOURLY_VARIABLES.to_string()),
        ]);

        self.get_forecast(&params).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn daily_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        unit: TemperatureUnit,
    ) -> Result<DailyWeatherResponse, WeatherError> {
        let mut params = coordinate_params(coordinates);
        params.extend([
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("timezone", "auto".to_string()),
            ("temperature_unit", unit.unit_name().to_string()),
            ("timeformat", "unixtime".to_string()),
            ("daily", DAILY_VARIABLES.to_string()),
        ]);

        self.get_forecast(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_current_weather_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "52.52"))
            .and(query_param("longitude", "13.41"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .and(query_param("windspeed_unit", "kmh"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 52.52,
                "longitude": 13.41,
                "current_weather": {"temperature": 45.3, "weathercode": 61, "is_day": 0}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::with_base_url(&mock_server.uri());
        let response = client
            .current_weather(Coordinates::new(52.52, 13.41), TemperatureUnit::Fahrenheit)
            .await
            .unwrap();

        assert_eq!(response.current_weather.weathercode, 61);
        assert_eq!(response.current_weather.is_day, 0);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Latitude must be in range of -90 to 90°"
            })))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::with_base_url(&mock_server.uri());
        let result = client
            .current_weather(Coordinates::new(120.0, 0.0), TemperatureUnit::Celsius)
            .await;

        match result {
            Err(WeatherError::Status { status, url }) => {
                assert_eq!(status, 400);
                assert!(url.contains("latitude=120"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::with_base_url(&mock_server.uri());
        let result = client
            .current_weather(Coordinates::new(1.0, 1.0), TemperatureUnit::Celsius)
            .await;

        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_daily_forecast_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("start_date", "2024-03-01"))
            .and(query_param("end_date", "2024-03-01"))
            .and(query_param("timezone", "auto"))
            .and(query_param("timeformat", "unixtime"))
            .and(query_param("daily", DAILY_VARIABLES))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "timezone": "Europe/Berlin",
                "utc_offset_seconds": 3600,
                "daily": {
                    "time": [1709247600],
                    "temperature_2m_min": [1.2],
                    "temperature_2m_max": [8.9],
                    "apparent_temperature_min": [-2.0],
                    "apparent_temperature_max": [6.1],
                    "sunrise": [1709272980],
                    "sunset": [1709311980],
                    "uv_index_max": [2.1],
                    "winddirection_10m_dominant": [240],
                    "windspeed_10m_max": [19.4]
                }
            })))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::with_base_url(&mock_server.uri());
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let response = client
            .daily_forecast(Coordinates::new(52.52, 13.41), day, day, TemperatureUnit::Celsius)
            .await
            .unwrap();

        assert_eq!(response.timezone, "Europe/Berlin");
        assert!(response.daily.weathercode.is_empty());
    }
}
