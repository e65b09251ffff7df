use lemon_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError as CoreWeatherError};
use lemon_weather::WeatherError;

use super::IntoAppError;

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Status { status, url } => AppError::Network(NetworkError::ServerError {
                status,
                message: url,
            }),
            WeatherError::Location(e) => AppError::Location(e),
            WeatherError::Geocode(s) => AppError::Weather(CoreWeatherError::ApiError(s)),
            WeatherError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
            WeatherError::UnknownWeatherCode(code) => AppError::Weather(
                CoreWeatherError::UnsupportedData(format!("weather code {}", code)),
            ),
        }
    }
}
