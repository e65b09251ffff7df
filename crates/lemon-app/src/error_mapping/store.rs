use lemon_core::AppError;
use lemon_store::StoreError;

use super::IntoAppError;

impl IntoAppError for StoreError {
    fn into_app_error(self) -> AppError {
        AppError::Database(self.into_database_error())
    }
}
