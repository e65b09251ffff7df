//! Centralized error types for the Lemon application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Saved-location storage errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to access saved locations. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => "A data operation failed. Please try again.",
            DatabaseError::Corruption(_) => {
                "Saved locations may be corrupted. Consider resetting app data."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Device location errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    ServiceUnavailable,

    #[error("Could not resolve a name for this location: {0}")]
    NameUnavailable(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location access was denied.",
            LocationError::ServiceUnavailable => {
                "Your location is unavailable. Set a home location in the settings."
            }
            LocationError::NameUnavailable(_) => "Could not determine the name of your location.",
        }
    }
}

/// Weather service errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Unsupported weather code: {0}")]
    UnsupportedData(String),

    #[error("Weather for {failed} saved location(s) could not be refreshed: {detail}")]
    PartialRefresh { failed: usize, detail: String },
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::UnsupportedData(_) => {
                "The weather service returned data this version cannot show."
            }
            WeatherError::PartialRefresh { .. } => {
                "Some saved locations could not be refreshed. Please retry."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Network(NetworkError::Timeout),
            AppError::Database(DatabaseError::QueryFailed("test".into())),
            AppError::Config(ConfigError::Invalid("test".into())),
            AppError::Location(LocationError::ServiceUnavailable),
            AppError::Config(ConfigError::ParseError("test".into())),
            AppError::Weather(WeatherError::ApiError("test".into())),
            AppError::Weather(WeatherError::PartialRefresh {
                failed: 2,
                detail: "Paris, Oslo".into(),
            }),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {:?}", err);
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = LocationError::PermissionDenied.into();
        assert!(matches!(
            err,
            AppError::Location(LocationError::PermissionDenied)
        ));
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let server = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(server.user_message().contains("later"));
        assert_eq!(client.user_message(), "The request failed. Please try again.");
    }

    #[test]
    fn test_rusqlite_error_mapping() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
