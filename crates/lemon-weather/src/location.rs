//! Device location.
//!
//! Without a platform location service the "current" location is the home
//! position from the config file.

use async_trait::async_trait;
use lemon_core::LocationConfig;

use crate::types::{Coordinates, LocationError};

#[async_trait]
pub trait CurrentLocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocationProvider {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocationProvider {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            coordinates: config
                .coordinates()
                .map(|(lat, lon)| Coordinates::new(lat, lon)),
        }
    }

    pub fn fixed(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
        }
    }

    pub fn is_available(&self) -> bool {
        self.coordinates.is_some()
    }
}

#[async_trait]
impl CurrentLocationProvider for ConfiguredLocationProvider {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or_else(|| {
            tracing::debug!("No home location configured");
            LocationError::ServiceUnavailable
        })
    }
}
