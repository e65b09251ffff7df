//! Wire shapes returned by the Open-Meteo forecast endpoint.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub current_weather: CurrentWeatherBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherBlock {
    pub temperature: f64,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddirection: Option<f64>,
    pub weathercode: i32,
    pub is_day: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyWeatherResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub hourly: HourlyBlock,
}

/// Parallel arrays indexed by hour; `time` is unix seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<i64>,
    #[serde(default)]
    pub weathercode: Vec<Option<i32>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyWeatherResponse {
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub daily: DailyBlock,
}

/// Parallel arrays indexed by day; `time`, `sunrise` and `sunset` are unix seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBlock {
    pub time: Vec<i64>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub apparent_temperature_min: Vec<Option<f64>>,
    pub apparent_temperature_max: Vec<Option<f64>>,
    pub sunrise: Vec<i64>,
    pub sunset: Vec<i64>,
    pub uv_index_max: Vec<Option<f64>>,
    pub winddirection_10m_dominant: Vec<Option<i32>>,
    pub windspeed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub weathercode: Vec<Option<i32>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<i32>>,
}

/// Variables requested for the `hourly` block
pub const HOURLY_VARIABLES: &str = "weathercode,precipitation_probability,temperature_2m";

/// Variables requested for the `daily` block
pub const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,apparent_temperature_max,apparent_temperature_min,sunrise,sunset,uv_index_max,windspeed_10m_max,winddirection_10m_dominant,weathercode,precipitation_probability_max";
