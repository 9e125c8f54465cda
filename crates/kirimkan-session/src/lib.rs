//! Messaging-network session lifecycle and device identity storage.
//!
//! Provides:
//! - `SessionManager` - Pair or reconnect, then publish the live session
//! - Identity store implementations (memory, SQLite)
//! - `LoopbackNetwork` - In-process network for local runs and tests
//! - Pairing-code presenters (terminal QR behind feature: qr)

pub mod identity;
pub mod loopback;
pub mod manager;
pub mod presenter;

pub use loopback::LoopbackNetwork;
pub use manager::{SessionError, SessionManager, SessionState};
pub use presenter::{LogPresenter, PairingPresenter};

#[cfg(feature = "qr")]
pub use presenter::TerminalQrPresenter;
