//! SQL backing store over `sqlx` (feature-gated).
//!
//! Works with `mysql://` and `sqlite://` URLs through the `Any` driver.

use async_trait::async_trait;
use kirimkan_core::traits::{StoreConnection, StoreConnector, StoreError};
use sqlx::{AnyPool, Connection, any::AnyPoolOptions};

const MYSQL_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS whatsapp \
     (id INT PRIMARY KEY AUTO_INCREMENT, nomor VARCHAR(16) UNIQUE NOT NULL)";

const SQLITE_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS whatsapp \
     (id INTEGER PRIMARY KEY AUTOINCREMENT, nomor VARCHAR(16) UNIQUE NOT NULL)";

/// SQL flavour, picked from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    /// Detect the dialect of a connection URL.
    ///
    /// # Errors
    /// Returns error for unsupported schemes.
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let scheme = url.split_once(':').map_or("", |(scheme, _)| scheme);
        match scheme {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(StoreError::Unavailable(format!(
                "unsupported database scheme {other:?}"
            ))),
        }
    }

    const fn table_ddl(self) -> &'static str {
        match self {
            Self::MySql => MYSQL_TABLE_DDL,
            Self::Sqlite => SQLITE_TABLE_DDL,
        }
    }
}

/// Opens pooled SQL connections.
pub struct SqlConnector {
    url: String,
    dialect: Dialect,
    max_connections: u32,
}

impl SqlConnector {
    /// Create a connector for `url`.
    ///
    /// # Errors
    /// Returns error for unsupported URL schemes.
    pub fn new(url: impl Into<String>, max_connections: u32) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();
        let url = url.into();
        let dialect = Dialect::from_url(&url)?;
        Ok(Self {
            url,
            dialect,
            max_connections: max_connections.max(1),
        })
    }
}

#[async_trait]
impl StoreConnector for SqlConnector {
    type Connection = SqlConnection;

    async fn open(&self) -> Result<SqlConnection, StoreError> {
        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let conn = SqlConnection {
            pool,
            dialect: self.dialect,
        };
        if let Err(e) = conn.ping().await {
            conn.close().await;
            return Err(e);
        }
        Ok(conn)
    }
}

/// A pooled SQL handle.
pub struct SqlConnection {
    pool: AnyPool,
    dialect: Dialect,
}

#[async_trait]
impl StoreConnection for SqlConnection {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.ping()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn create_destination_table(&self) -> Result<(), StoreError> {
        sqlx::query(self.dialect.table_ddl())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn find_destination(&self, identifier: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT id FROM whatsapp WHERE nomor = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn insert_destination(&self, identifier: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO whatsapp (nomor) VALUES (?)")
            .bind(identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }
}
