//! In-memory identity store.

use std::sync::RwLock;

use async_trait::async_trait;
use kirimkan_core::traits::{DeviceIdentity, IdentityError, IdentityStore};

/// In-memory identity store.
///
/// Useful for tests and throwaway runs.
/// The paired identity is lost on restart.
#[derive(Default)]
pub struct MemoryIdentityStore {
    device: RwLock<Option<DeviceIdentity>>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a paired device.
    #[must_use]
    pub fn with_device(device: DeviceIdentity) -> Self {
        Self {
            device: RwLock::new(Some(device)),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn init(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn load_device(&self) -> Result<Option<DeviceIdentity>, IdentityError> {
        Ok(self
            .device
            .read()
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .clone())
    }

    async fn save_device(&self, device: &DeviceIdentity) -> Result<(), IdentityError> {
        *self
            .device
            .write()
            .map_err(|e| IdentityError::Internal(e.to_string()))? = Some(device.clone());
        Ok(())
    }

    async fn delete_device(&self) -> Result<(), IdentityError> {
        self.device
            .write()
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .take();
        Ok(())
    }
}
