//! SQLite-backed list of the user's saved locations.
//!
//! Every write publishes the full list on a watch channel so screens can
//! follow the saved set without polling.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use tokio::sync::watch;

use lemon_weather::{Coordinates, SavedLocation};

use crate::error::StoreError;

pub struct SavedLocationStore {
    conn: Mutex<Connection>,
    changes: watch::Sender<Vec<SavedLocation>>,
}

impl SavedLocationStore {
    /// Open (or create) the store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::info!("Opened saved locations database at {:?}", path);
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS saved_weather_locations (
                name_of_location TEXT PRIMARY KEY NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            );
            "#,
        )?;

        let initial = Self::query_all(&conn)?;
        let (changes, _) = watch::channel(initial);

        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    fn query_all(conn: &Connection) -> Result<Vec<SavedLocation>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT name_of_location, latitude, longitude
             FROM saved_weather_locations
             ORDER BY rowid",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(SavedLocation::new(
                row.get::<_, String>(0)?,
                Coordinates::new(row.get(1)?, row.get(2)?),
            ))
        })?;

        let locations = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    /// Saved locations in the order they were last written.
    pub fn list(&self) -> Result<Vec<SavedLocation>, StoreError> {
        Self::query_all(&self.conn.lock())
    }

    /// Insert a location, replacing any existing entry with the same name.
    pub fn upsert(&self, location: &SavedLocation) -> Result<(), StoreError> {
        validate(location)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO saved_weather_locations (name_of_location, latitude, longitude)
             VALUES (?1, ?2, ?3)",
            params![
                location.name,
                location.coordinates.latitude,
                location.coordinates.longitude
            ],
        )?;
        tracing::debug!("Saved location {}", location.name);

        self.publish(&conn)
    }

    /// Returns whether a location with this name existed.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM saved_weather_locations WHERE name_of_location = ?1",
            params![name],
        )?;

        if removed == 0 {
            return Ok(false);
        }
        tracing::debug!("Removed saved location {}", name);
        self.publish(&conn)?;
        Ok(true)
    }

    pub fn contains(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM saved_weather_locations WHERE name_of_location = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Receiver holding the current list, updated after every write.
    pub fn subscribe(&self) -> watch::Receiver<Vec<SavedLocation>> {
        self.changes.subscribe()
    }

    fn publish(&self, conn: &Connection) -> Result<(), StoreError> {
        let locations = Self::query_all(conn)?;
        self.changes.send_replace(locations);
        Ok(())
    }
}

fn validate(location: &SavedLocation) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidLocation {
        name: location.name.clone(),
        reason: reason.to_string(),
    };

    if location.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    let Coordinates {
        latitude,
        longitude,
    } = location.coordinates;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid("latitude out of range"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid("longitude out of range"));
    }
    Ok(())
}
