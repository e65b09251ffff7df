//! Place search (Open-Meteo geocoding) and reverse geocoding (Nominatim).

use async_trait::async_trait;
use lemon_core::WeatherConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::types::{Coordinates, LocationAutofillSuggestion, LocationError, WeatherError};

const USER_AGENT: &str = concat!("Lemon/", env!("CARGO_PKG_VERSION"));
const FLAG_URL_BASE: &str = "https://open-meteo.com/images/country-flags";

/// Autocomplete lookup for place names.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn suggestions(&self, query: &str)
        -> Result<Vec<LocationAutofillSuggestion>, WeatherError>;
}

/// Coordinates to a human-readable place name.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn location_name(&self, coordinates: Coordinates) -> Result<String, LocationError>;
}

#[derive(Debug, Deserialize)]
struct SuggestionsResponse {
    #[serde(default)]
    results: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    id: PlaceId,
    name: String,
    country: Option<String>,
    admin1: Option<String>,
    country_code: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlaceId {
    Number(i64),
    Text(String),
}

impl PlaceId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl Suggestion {
    /// Entries without a state, country and country code cannot be shown and are dropped
    fn into_autofill(self) -> Option<LocationAutofillSuggestion> {
        let state = self.admin1?;
        let country = self.country?;
        let code = self.country_code?;

        Some(LocationAutofillSuggestion {
            id: self.id.into_string(),
            name: self.name,
            address: format!("{}, {}", state, country),
            coordinates: Coordinates::new(self.latitude, self.longitude),
            country_flag_url: format!("{}/{}.svg", FLAG_URL_BASE, code.to_lowercase()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
    count: u32,
}

impl OpenMeteoGeocoder {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.geocoding_api_url.trim_end_matches('/').to_string(),
            count: config.suggestion_count,
        })
    }

    pub fn with_base_url(base_url: &str, count: u32) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            count,
        }
    }
}

#[async_trait]
impl PlaceSearch for OpenMeteoGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<LocationAutofillSuggestion>, WeatherError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query.to_string()),
                ("count", self.count.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body: SuggestionsResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Geocode(format!("invalid search response: {}", e)))?;

        let suggestions: Vec<_> = body
            .results
            .into_iter()
            .filter_map(Suggestion::into_autofill)
            .collect();

        tracing::debug!("{} suggestions for {:?}", suggestions.len(), query);
        Ok(suggestions)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub state_district: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
}

/// Builds "place, state" (or "place, country") from a Nominatim address.
///
/// The most specific of city, town, village and municipality wins; broader
/// areas are used when none of those are present. The suffix is omitted when
/// it would repeat the place.
pub fn format_place(addr: NominatimAddress) -> Option<String> {
    let state = addr.state.clone();
    let country = addr.country.clone();

    let place = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(addr.state_district)
        .or(addr.county)
        .or(addr.state)
        .or(addr.country)?;

    let suffix = [state, country]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty() && *s != place);

    Some(match suffix {
        Some(s) => format!("{}, {}", place, s),
        None => place,
    })
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: config.reverse_geocode_url.clone(),
        })
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn location_name(&self, coordinates: Coordinates) -> Result<String, LocationError> {
        let unavailable = |reason: String| {
            tracing::debug!("Reverse geocode failed: {}", reason);
            LocationError::NameUnavailable(reason)
        };

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("layer", "address".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("status {}", response.status())));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let name = body
            .address
            .and_then(format_place)
            .ok_or_else(|| unavailable(format!("no address near {}", coordinates)))?;

        tracing::info!("Reverse geocoded to: {}", name);
        Ok(name)
    }
}
