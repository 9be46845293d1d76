//! SQLite-backed listing store
//!
//! Rows keep the raw-string layout of `CachedAdvertisement`; all blocking
//! database work runs on the tokio blocking pool.

use super::{AdvertisementStore, CacheKind, StoreError};
use crate::models::{Advertisement, CachedAdvertisement};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// SQLite listing store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS advertisements (
                kind TEXT NOT NULL,
                object_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                transport_name TEXT NOT NULL,
                transport_model TEXT NOT NULL,
                price INTEGER NOT NULL,
                year_of_manufacture INTEGER NOT NULL,
                mileage INTEGER NOT NULL,
                power INTEGER NOT NULL,
                body_type TEXT NOT NULL,
                fuel_type TEXT NOT NULL,
                transmission_type TEXT NOT NULL,
                seller_type TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                photos TEXT NOT NULL,
                created INTEGER NOT NULL,
                PRIMARY KEY (kind, object_id)
            );
            CREATE INDEX IF NOT EXISTS idx_advertisements_created
                ON advertisements(kind, created DESC);",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<CachedAdvertisement> {
    Ok(CachedAdvertisement {
        object_id: row.get("object_id")?,
        owner_id: row.get("owner_id")?,
        transport_name: row.get("transport_name")?,
        transport_model: row.get("transport_model")?,
        price: row.get("price")?,
        year_of_manufacture: row.get("year_of_manufacture")?,
        mileage: row.get("mileage")?,
        power: row.get("power")?,
        body_type: row.get("body_type")?,
        fuel_type: row.get("fuel_type")?,
        transmission_type: row.get("transmission_type")?,
        seller_type: row.get("seller_type")?,
        description: row.get("description")?,
        location: row.get("location")?,
        phone_number: row.get("phone_number")?,
        photos: row.get("photos")?,
        created: row.get("created")?,
    })
}

fn write_rows(
    conn: &Connection,
    kind: CacheKind,
    ads: &[Advertisement],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO advertisements (
            kind, object_id, owner_id, transport_name, transport_model, price,
            year_of_manufacture, mileage, power, body_type, fuel_type,
            transmission_type, seller_type, description, location, phone_number,
            photos, created
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    )?;

    for ad in ads {
        let row = ad.to_cached();
        stmt.execute(params![
            kind.as_str(),
            row.object_id,
            row.owner_id,
            row.transport_name,
            row.transport_model,
            row.price,
            row.year_of_manufacture,
            row.mileage,
            row.power,
            row.body_type,
            row.fuel_type,
            row.transmission_type,
            row.seller_type,
            row.description,
            row.location,
            row.phone_number,
            row.photos,
            row.created,
        ])?;
    }
    Ok(())
}

#[async_trait]
impl AdvertisementStore for SqliteStore {
    async fn fetch(&self, kind: CacheKind) -> Result<Vec<Advertisement>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT * FROM advertisements WHERE kind = ?1 ORDER BY created DESC",
            )?;
            let rows = stmt.query_map(params![kind.as_str()], read_row)?;

            let mut ads = Vec::new();
            for row in rows {
                ads.push(Advertisement::from_cached(row?));
            }
            Ok(ads)
        })
        .await
    }

    async fn synchronize(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM advertisements WHERE kind = ?1",
                params![kind.as_str()],
            )?;
            write_rows(&tx, kind, &ads)?;
            tx.commit()?;
            debug!("Synchronized {} cached {} listings", ads.len(), kind.as_str());
            Ok(())
        })
        .await
    }

    async fn upsert(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            write_rows(&tx, kind, &ads)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, kind: CacheKind, object_id: &str) -> Result<(), StoreError> {
        let object_id = object_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM advertisements WHERE kind = ?1 AND object_id = ?2",
                params![kind.as_str(), object_id],
            )?;
            Ok(())
        })
        .await
    }

    async fn trim(&self, kind: CacheKind, keep: usize) -> Result<usize, StoreError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM advertisements WHERE kind = ?1 AND object_id NOT IN (
                    SELECT object_id FROM advertisements WHERE kind = ?1
                    ORDER BY created DESC LIMIT ?2
                )",
                params![kind.as_str(), keep],
            )?;
            if removed > 0 {
                debug!("Trimmed {} cached {} listings", removed, kind.as_str());
            }
            Ok(removed)
        })
        .await
    }
}
