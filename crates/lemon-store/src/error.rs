use lemon_core::{DatabaseError, RusqliteErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid saved location {name}: {reason}")]
    InvalidLocation { name: String, reason: String },
}

impl StoreError {
    pub fn into_database_error(self) -> DatabaseError {
        match self {
            Self::Database(e) => e.into_database_error(),
            Self::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            Self::InvalidLocation { .. } => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
