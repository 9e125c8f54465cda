//! HTTP transport for the Kirimkan gateway.
//!
//! Provides:
//! - Wire protocol (`SendRequest` / `SendResponse`)
//! - The send-message dispatcher
//! - Router wiring, including static assets (feature: static-files)

pub mod dispatcher;
pub mod protocol;
pub mod router;

pub use dispatcher::{DispatchState, send_message};
pub use protocol::{SendRequest, SendResponse, Status};
pub use router::{SEND_MESSAGE_PATH, api_router};

#[cfg(feature = "static-files")]
pub use router::router;
