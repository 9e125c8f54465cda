//! Core traits for the messaging network, identity and backing stores.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Jid, PairingEvent};

/// A paired device identity.
///
/// Opaque to the gateway beyond being present or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// The device's own address on the network.
    pub jid: Jid,
    /// Credential material issued during pairing.
    pub credentials: Vec<u8>,
}

/// Acknowledgement for a submitted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceipt {
    /// Server-side message identifier.
    pub id: String,
    /// Server timestamp (Unix epoch seconds).
    pub timestamp: i64,
}

/// Messaging network error.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Not connected")]
    NotConnected,
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Pairing channel unavailable: {0}")]
    PairingChannel(String),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Send failed: {0}")]
    Send(String),
}

/// A client session on the messaging network.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Identity this client authenticates with, if paired.
    fn device(&self) -> Option<DeviceIdentity>;

    /// Whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Open the pairing-event stream.
    ///
    /// Must be called before [`MessagingClient::connect`] on an unpaired client.
    async fn pairing_events(&self) -> Result<BoxStream<'static, PairingEvent>, NetworkError>;

    /// Open the network connection.
    async fn connect(&self) -> Result<(), NetworkError>;

    /// Close the network connection.
    async fn disconnect(&self);

    /// Submit a plain-text message.
    async fn send_text(&self, to: &Jid, body: &str) -> Result<MessageReceipt, NetworkError>;
}

/// Factory for clients bound to a device identity.
pub trait MessagingNetwork: Send + Sync {
    /// Create a client for `device`, or an unpaired client when `None`.
    ///
    /// The client persists a freshly paired identity into `identity`.
    fn new_client(
        &self,
        device: Option<DeviceIdentity>,
        identity: Arc<dyn IdentityStore>,
    ) -> Arc<dyn MessagingClient>;
}

/// Identity store error.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity store error: {0}")]
    Internal(String),
    #[error("Corrupt identity: {0}")]
    Corrupt(String),
}

/// Local store holding the paired device identity.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Prepare the store for use.
    async fn init(&self) -> Result<(), IdentityError>;

    /// Load the paired device, if any.
    async fn load_device(&self) -> Result<Option<DeviceIdentity>, IdentityError>;

    /// Persist the paired device, replacing any previous one.
    async fn save_device(&self, device: &DeviceIdentity) -> Result<(), IdentityError>;

    /// Forget the paired device.
    async fn delete_device(&self) -> Result<(), IdentityError>;
}

/// Source of the published session handle.
pub trait SessionSource: Send + Sync {
    /// The live session, or `None` when no session is published.
    fn current(&self) -> Option<Arc<dyn MessagingClient>>;
}

/// Backing store error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Query failed: {0}")]
    Query(String),
}

/// Opens connections to the relational backing store.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connection handle type.
    type Connection: StoreConnection + 'static;

    /// Open a new connection, confirming it is usable.
    async fn open(&self) -> Result<Self::Connection, StoreError>;
}

/// A handle to the relational backing store.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Round-trip liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release the handle.
    async fn close(&self);

    /// Create the destination table if missing.
    async fn create_destination_table(&self) -> Result<(), StoreError>;

    /// Whether a record exists for `identifier`.
    async fn find_destination(&self, identifier: &str) -> Result<bool, StoreError>;

    /// Insert a record for `identifier`.
    async fn insert_destination(&self, identifier: &str) -> Result<(), StoreError>;
}

/// Result of recording a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new record was written.
    Inserted,
    /// The identifier was already known.
    AlreadyRecorded,
}

/// Destination recording error.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Store unavailable: {0}")]
    Unavailable(StoreError),
    #[error("Lookup failed: {0}")]
    Lookup(StoreError),
    #[error("Insert failed: {0}")]
    Insert(StoreError),
}

/// Records which destinations have been messaged.
///
/// Best-effort: callers log errors and carry on.
#[async_trait]
pub trait DestinationRecorder: Send + Sync {
    /// Record `identifier` unless it is already known.
    async fn record_destination(&self, identifier: &str) -> Result<RecordOutcome, RecordError>;
}
