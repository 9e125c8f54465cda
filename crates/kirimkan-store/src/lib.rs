//! Backing-store connection management and destination recording.
//!
//! Provides:
//! - `StoreConnectionManager` - Lazily (re)established shared store handle
//! - `DestinationRegistry` - Best-effort record of messaged destinations
//! - SQL backend over `sqlx` (feature: sql)

pub mod connection;
pub mod registry;

#[cfg(feature = "sql")]
pub mod sql;

pub use connection::StoreConnectionManager;
pub use registry::DestinationRegistry;

#[cfg(feature = "sql")]
pub use sql::{SqlConnection, SqlConnector};
