//! Core abstractions for the Kirimkan messaging gateway.
//!
//! This crate provides the fundamental building blocks:
//! - `Jid` - Fully qualified addresses on the messaging network
//! - `PairingEvent` - Events surfaced while pairing a new device
//! - `Config` - Process configuration loaded once at startup
//! - Network, identity and backing-store traits

pub mod config;
pub mod jid;
pub mod pairing;
pub mod traits;

pub use config::{Config, ConfigError};
pub use jid::{DEFAULT_USER_SERVER, Jid};
pub use pairing::PairingEvent;
pub use traits::{
    DestinationRecorder, IdentityStore, MessagingClient, MessagingNetwork, SessionSource,
    StoreConnection, StoreConnector,
};
