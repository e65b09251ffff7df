use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Name used by the forecast API's `temperature_unit` parameter.
    pub fn unit_name(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.unit_name())
    }
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Home location used when the device position is requested
    #[serde(default)]
    pub location: LocationConfig,

    /// HTTP retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Saved-location storage
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Temperature unit preference
    pub temperature_unit: TemperatureUnit,

    /// `windspeed_unit` sent with current weather requests
    pub windspeed_unit: String,

    /// `precipitation_unit` sent with forecast requests
    pub precipitation_unit: String,

    /// Base URL of the Open-Meteo forecast API
    pub forecast_api_url: String,

    /// Base URL of the Open-Meteo geocoding API
    pub geocoding_api_url: String,

    /// Nominatim reverse geocoding endpoint
    pub reverse_geocode_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Upper bound on simultaneous saved-location fetches
    pub max_concurrent_fetches: usize,

    /// Quiet period before a search query is sent
    pub suggestion_debounce_ms: u64,

    /// Maximum number of autofill suggestions requested
    pub suggestion_count: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            windspeed_unit: "kmh".to_string(),
            precipitation_unit: "inch".to_string(),
            forecast_api_url: "https://api.open-meteo.com/v1".to_string(),
            geocoding_api_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            reverse_geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            request_timeout_secs: 10,
            max_concurrent_fetches: 4,
            suggestion_debounce_ms: 250,
            suggestion_count: 10,
        }
    }
}

/// Fixed device position. Desktop builds have no positioning hardware, so
/// the "current location" comes from here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name, relative to `config_dir` unless absolute
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "saved_locations.db".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lemon");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            retry: RetrySettings::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit file, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::Config(ConfigError::ParseError(e.to_string())))
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(AppError::Config(ConfigError::Invalid(validation.error_summary()))
                .into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.weather.forecast_api_url,
            "weather.forecast_api_url",
            &mut result,
        );
        self.validate_url(
            &self.weather.geocoding_api_url,
            "weather.geocoding_api_url",
            &mut result,
        );
        self.validate_url(
            &self.weather.reverse_geocode_url,
            "weather.reverse_geocode_url",
            &mut result,
        );

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Request timeout is unusually long (>120s)",
            );
        }

        if self.weather.max_concurrent_fetches == 0 {
            result.add_error(
                "weather.max_concurrent_fetches",
                "At least one concurrent fetch is required",
            );
        }

        if self.weather.suggestion_count == 0 {
            result.add_warning(
                "weather.suggestion_count",
                "Location search will never return suggestions",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within -180..180");
                }
            }
            (None, None) => {
                result.add_warning(
                    "location",
                    "No home location configured - current location weather is unavailable",
                );
            }
            _ => {
                result.add_error(
                    "location",
                    "Both latitude and longitude must be set together",
                );
            }
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            result.add_warning(
                "retry.initial_delay_ms",
                "Initial retry delay exceeds the maximum delay",
            );
        }

        if self.storage.database_file.trim().is_empty() {
            result.add_error("storage.database_file", "Database file name is empty");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Absolute path of the saved-locations database
    pub fn database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.storage.database_file);
        if file.is_absolute() {
            file
        } else {
            self.config_dir.join(file)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("lemon");

        Ok(config_dir.join("config.toml"))
    }
}
