//! SQLite Settings Repository
//!
//! Implements StoreLocationRepository and ProductSettingsRepository using
//! SQLite. The store coordinate lives in a key/value `options` table;
//! product settings get a table of their own.

use crate::domain::entities::ProductDeliverySettings;
use crate::domain::ports::{ProductSettingsRepository, StoreLocationRepository};
use crate::domain::value_objects::{Coordinate, DeliveryRadius};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const STORE_LATITUDE: &str = "store_latitude";
const STORE_LONGITUDE: &str = "store_longitude";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS options (
        name  TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS product_delivery (
        product_id   INTEGER PRIMARY KEY,
        title        TEXT NOT NULL DEFAULT '',
        enabled      INTEGER NOT NULL DEFAULT 0,
        radius_miles REAL
    );
";

/// SQLite-backed settings repository.
///
/// All statements run on a blocking thread behind a single connection.
pub struct SqliteSettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSettingsRepository {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, mainly for tests.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await?
    }

    fn get_option(conn: &Connection, name: &str) -> Result<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_option(conn: &Connection, name: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    /// Convert a SQLite row to product settings.
    fn row_to_settings(row: &Row) -> rusqlite::Result<ProductDeliverySettings> {
        let radius: Option<f64> = row.get(3)?;
        Ok(ProductDeliverySettings {
            product_id: row.get::<_, i64>(0)? as u64,
            title: row.get(1)?,
            local_delivery_enabled: row.get::<_, i64>(2)? != 0,
            radius: radius.and_then(DeliveryRadius::new),
        })
    }
}

#[async_trait]
impl StoreLocationRepository for SqliteSettingsRepository {
    async fn get_store_location(&self) -> Result<Option<Coordinate>> {
        self.run(|conn| {
            let lat = Self::get_option(conn, STORE_LATITUDE)?;
            let lon = Self::get_option(conn, STORE_LONGITUDE)?;

            match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    let coordinate = Coordinate::new(lat.trim().parse()?, lon.trim().parse()?);
                    if !coordinate.is_valid() {
                        anyhow::bail!("stored store coordinate out of range: {}", coordinate);
                    }
                    Ok(Some(coordinate))
                }
                _ => Ok(None),
            }
        })
        .await
    }

    async fn set_store_location(&self, coordinate: Coordinate) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.unchecked_transaction()?;
            Self::set_option(&tx, STORE_LATITUDE, &coordinate.latitude.to_string())?;
            Self::set_option(&tx, STORE_LONGITUDE, &coordinate.longitude.to_string())?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ProductSettingsRepository for SqliteSettingsRepository {
    async fn get_product_settings(&self, product_id: u64) -> Result<Option<ProductDeliverySettings>> {
        self.run(move |conn| {
            let settings = conn
                .query_row(
                    "SELECT product_id, title, enabled, radius_miles
                     FROM product_delivery
                     WHERE product_id = ?1",
                    params![product_id as i64],
                    Self::row_to_settings,
                )
                .optional()?;
            Ok(settings)
        })
        .await
    }

    async fn save_product_settings(&self, settings: ProductDeliverySettings) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO product_delivery (product_id, title, enabled, radius_miles)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(product_id) DO UPDATE SET
                     title = excluded.title,
                     enabled = excluded.enabled,
                     radius_miles = excluded.radius_miles",
                params![
                    settings.product_id as i64,
                    settings.title,
                    settings.local_delivery_enabled as i64,
                    settings.radius.map(|r| r.miles()),
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(id: u64, enabled: bool, radius: Option<f64>) -> ProductDeliverySettings {
        ProductDeliverySettings {
            product_id: id,
            title: format!("product-{}", id),
            local_delivery_enabled: enabled,
            radius: radius.and_then(DeliveryRadius::new),
        }
    }

    // ===== Store Location Tests =====

    #[tokio::test]
    async fn test_store_location_unset() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        assert_eq!(repo.get_store_location().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_location_round_trip() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        let coord = Coordinate::new(40.0, -75.0);

        repo.set_store_location(coord).await.unwrap();
        assert_eq!(repo.get_store_location().await.unwrap(), Some(coord));
    }

    #[tokio::test]
    async fn test_store_location_overwrite() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();

        repo.set_store_location(Coordinate::new(40.0, -75.0))
            .await
            .unwrap();
        repo.set_store_location(Coordinate::new(51.5074, -0.1278))
            .await
            .unwrap();

        assert_eq!(
            repo.get_store_location().await.unwrap(),
            Some(Coordinate::new(51.5074, -0.1278))
        );
    }

    #[tokio::test]
    async fn test_half_written_location_is_unset() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        repo.run(|conn| SqliteSettingsRepository::set_option(conn, STORE_LATITUDE, "40.0"))
            .await
            .unwrap();

        assert_eq!(repo.get_store_location().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_location_is_an_error() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        repo.run(|conn| {
            SqliteSettingsRepository::set_option(conn, STORE_LATITUDE, "forty")?;
            SqliteSettingsRepository::set_option(conn, STORE_LONGITUDE, "-75.0")
        })
        .await
        .unwrap();

        assert!(repo.get_store_location().await.is_err());
    }

    #[tokio::test]
    async fn test_location_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.db");
        let path = path.to_str().unwrap();

        {
            let repo = SqliteSettingsRepository::open(path).unwrap();
            repo.set_store_location(Coordinate::new(40.0, -75.0))
                .await
                .unwrap();
        }

        let reopened = SqliteSettingsRepository::open(path).unwrap();
        assert_eq!(
            reopened.get_store_location().await.unwrap(),
            Some(Coordinate::new(40.0, -75.0))
        );
    }

    // ===== Product Settings Tests =====

    #[tokio::test]
    async fn test_product_settings_missing() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        assert_eq!(repo.get_product_settings(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_product_settings_round_trip() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();
        let saved = settings(42, true, Some(15.5));

        repo.save_product_settings(saved.clone()).await.unwrap();
        assert_eq!(repo.get_product_settings(42).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_product_settings_upsert() {
        let repo = SqliteSettingsRepository::in_memory().unwrap();

        repo.save_product_settings(settings(42, true, Some(10.0)))
            .await
            .unwrap();
        repo.save_product_settings(settings(42, false, None))
            .await
            .unwrap();

        let loaded = repo.get_product_settings(42).await.unwrap().unwrap();
        assert!(!loaded.local_delivery_enabled);
        assert_eq!(loaded.radius, None);
    }
}
