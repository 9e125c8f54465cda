//! SQLite identity store (feature-gated).

use std::path::Path;

use async_trait::async_trait;
use kirimkan_core::{
    Jid,
    traits::{DeviceIdentity, IdentityError, IdentityStore},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// SQLite-backed identity store.
///
/// Holds at most one device row. The file is created on first use.
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// Open a store at `path`.
    ///
    /// No I/O happens until [`IdentityStore::init`].
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        Self {
            pool: SqlitePoolOptions::new()
                .max_connections(1)
                .connect_lazy_with(options),
        }
    }
}

fn internal(e: sqlx::Error) -> IdentityError {
    IdentityError::Internal(e.to_string())
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn init(&self) -> Result<(), IdentityError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS device (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                jid TEXT NOT NULL,
                credentials BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    async fn load_device(&self) -> Result<Option<DeviceIdentity>, IdentityError> {
        let row: Option<(String, Vec<u8>)> =
            sqlx::query_as("SELECT jid, credentials FROM device WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(internal)?;

        row.map(|(jid, credentials)| {
            let jid = jid
                .parse::<Jid>()
                .map_err(|e| IdentityError::Corrupt(e.to_string()))?;
            Ok(DeviceIdentity { jid, credentials })
        })
        .transpose()
    }

    async fn save_device(&self, device: &DeviceIdentity) -> Result<(), IdentityError> {
        sqlx::query(
            "INSERT INTO device (id, jid, credentials) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET jid = excluded.jid, credentials = excluded.credentials",
        )
        .bind(device.jid.to_string())
        .bind(device.credentials.as_slice())
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    async fn delete_device(&self) -> Result<(), IdentityError> {
        sqlx::query("DELETE FROM device")
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(())
    }
}
