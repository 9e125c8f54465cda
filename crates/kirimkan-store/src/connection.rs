//! Shared, lazily (re)established backing-store handle.

use std::sync::Arc;

use kirimkan_core::traits::{StoreConnection, StoreConnector, StoreError};
use tokio::sync::Mutex;

/// Owns the single shared store handle.
///
/// Every acquisition runs the probe-and-replace sequence under one lock, so at
/// most one (re)connection attempt is in flight at a time.
pub struct StoreConnectionManager<C: StoreConnector> {
    connector: C,
    handle: Mutex<Option<Arc<C::Connection>>>,
}

impl<C: StoreConnector> StoreConnectionManager<C> {
    /// Create a manager. No connection is opened until first needed.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: Mutex::new(None),
        }
    }

    /// Return a live handle, opening or replacing it as needed.
    ///
    /// A handle that fails its liveness probe is closed and discarded. If
    /// opening fails the shared handle is left absent.
    ///
    /// # Errors
    /// Returns error if a new connection cannot be opened.
    pub async fn ensure_connection(&self) -> Result<Arc<C::Connection>, StoreError> {
        let mut handle = self.handle.lock().await;

        if let Some(conn) = handle.as_ref() {
            match conn.ping().await {
                Ok(()) => return Ok(Arc::clone(conn)),
                Err(e) => {
                    tracing::warn!("Store connection lost, reconnecting: {e}");
                    if let Some(dead) = handle.take() {
                        dead.close().await;
                    }
                }
            }
        }

        match self.connector.open().await {
            Ok(conn) => {
                tracing::info!("Connected to store");
                let conn = Arc::new(conn);
                *handle = Some(Arc::clone(&conn));
                Ok(conn)
            }
            Err(e) => {
                tracing::error!("Failed to connect to store: {e}");
                Err(e)
            }
        }
    }

    /// Whether a handle is currently held, without probing it.
    pub async fn has_connection(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}
