//! Best-effort record of messaged destinations.

use std::sync::Arc;

use async_trait::async_trait;
use kirimkan_core::traits::{
    DestinationRecorder, RecordError, RecordOutcome, StoreConnection, StoreConnector, StoreError,
};

use crate::StoreConnectionManager;

/// Records each destination identifier once.
///
/// Uniqueness is enforced by the table itself; a lost race against a
/// concurrent insert surfaces as [`RecordError::Insert`].
pub struct DestinationRegistry<C: StoreConnector> {
    store: Arc<StoreConnectionManager<C>>,
}

impl<C: StoreConnector> DestinationRegistry<C> {
    /// Create a registry over a shared connection manager.
    #[must_use]
    pub const fn new(store: Arc<StoreConnectionManager<C>>) -> Self {
        Self { store }
    }

    /// Create the destination table if it does not exist.
    ///
    /// # Errors
    /// Returns error if the store is unreachable or the table cannot be created.
    pub async fn prepare(&self) -> Result<(), StoreError> {
        let conn = self.store.ensure_connection().await?;
        conn.create_destination_table().await?;
        tracing::info!("Destination table ready");
        Ok(())
    }
}

#[async_trait]
impl<C: StoreConnector> DestinationRecorder for DestinationRegistry<C> {
    async fn record_destination(&self, identifier: &str) -> Result<RecordOutcome, RecordError> {
        let conn = self
            .store
            .ensure_connection()
            .await
            .map_err(RecordError::Unavailable)?;

        match conn.find_destination(identifier).await {
            Ok(true) => Ok(RecordOutcome::AlreadyRecorded),
            Ok(false) => match conn.insert_destination(identifier).await {
                Ok(()) => {
                    tracing::info!("Recorded destination +{identifier}");
                    Ok(RecordOutcome::Inserted)
                }
                Err(e) => {
                    tracing::warn!("Failed to record destination +{identifier}: {e}");
                    Err(RecordError::Insert(e))
                }
            },
            Err(e) => {
                tracing::warn!("Failed to look up destination +{identifier}: {e}");
                Err(RecordError::Lookup(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
        },
    };

    use super::*;

    /// In-memory table with injectable failures.
    #[derive(Default)]
    struct Table {
        rows: Mutex<HashSet<String>>,
        fail_lookup: AtomicBool,
        fail_insert: AtomicBool,
    }

    struct TableConnection(Arc<Table>);

    #[async_trait]
    impl StoreConnection for TableConnection {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn close(&self) {}

        async fn create_destination_table(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn find_destination(&self, identifier: &str) -> Result<bool, StoreError> {
            if self.0.fail_lookup.load(Ordering::SeqCst) {
                return Err(StoreError::Query("connection reset".to_string()));
            }
            Ok(self.0.rows.lock().unwrap().contains(identifier))
        }

        async fn insert_destination(&self, identifier: &str) -> Result<(), StoreError> {
            if self.0.fail_insert.load(Ordering::SeqCst) {
                return Err(StoreError::Query("duplicate entry".to_string()));
            }
            self.0.rows.lock().unwrap().insert(identifier.to_string());
            Ok(())
        }
    }

    struct TableConnector {
        table: Arc<Table>,
        available: bool,
    }

    #[async_trait]
    impl StoreConnector for TableConnector {
        type Connection = TableConnection;

        async fn open(&self) -> Result<TableConnection, StoreError> {
            if self.available {
                Ok(TableConnection(Arc::clone(&self.table)))
            } else {
                Err(StoreError::Unavailable("connection refused".to_string()))
            }
        }
    }

    fn registry(table: &Arc<Table>, available: bool) -> DestinationRegistry<TableConnector> {
        let connector = TableConnector {
            table: Arc::clone(table),
            available,
        };
        DestinationRegistry::new(Arc::new(StoreConnectionManager::new(connector)))
    }

    #[tokio::test]
    async fn test_records_once() {
        let table = Arc::new(Table::default());
        let registry = registry(&table, true);

        assert_eq!(
            registry.record_destination("6281234567890").await.unwrap(),
            RecordOutcome::Inserted
        );
        assert_eq!(
            registry.record_destination("6281234567890").await.unwrap(),
            RecordOutcome::AlreadyRecorded
        );
        assert_eq!(table.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_insert() {
        let table = Arc::new(Table::default());
        table.fail_lookup.store(true, Ordering::SeqCst);
        let registry = registry(&table, true);

        let err = registry.record_destination("628111").await.unwrap_err();
        assert!(matches!(err, RecordError::Lookup(_)));
        assert!(table.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_is_reported() {
        let table = Arc::new(Table::default());
        table.fail_insert.store(true, Ordering::SeqCst);
        let registry = registry(&table, true);

        let err = registry.record_destination("628111").await.unwrap_err();
        assert!(matches!(err, RecordError::Insert(_)));
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let table = Arc::new(Table::default());
        let registry = registry(&table, false);

        let err = registry.record_destination("628111").await.unwrap_err();
        assert!(matches!(err, RecordError::Unavailable(_)));
        assert!(registry.prepare().await.is_err());
    }
}
