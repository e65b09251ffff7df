//! Maps crate errors to lemon_core::AppError for consistent user-facing messages.
//! Each source has its own module to keep mappings small and readable.

mod reconcile;
mod store;
mod weather;

use lemon_core::AppError;

/// Conversion for errors owned by other crates, where a `From` impl is not allowed here.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}
