use lemon_core::{AppError, WeatherError};

use crate::cache::ReconcileError;

impl From<ReconcileError> for AppError {
    fn from(e: ReconcileError) -> Self {
        AppError::Weather(WeatherError::PartialRefresh {
            failed: e.failures.len(),
            detail: e.failed_names().join(", "),
        })
    }
}
