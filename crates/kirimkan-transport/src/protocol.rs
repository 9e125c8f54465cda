//! Wire protocol for the send-message endpoint.

use serde::{Deserialize, Serialize};

/// Body of a send-message request.
///
/// Missing fields decode as empty strings and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendRequest {
    /// Destination identifier, without domain.
    #[serde(default)]
    pub no: String,
    /// Message text.
    #[serde(default)]
    pub pesan: String,
}

impl SendRequest {
    /// Whether both fields are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.no.is_empty() && !self.pesan.is_empty()
    }
}

/// Outcome reported in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
}

/// Body of every send-message response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: Status,
    pub message: String,
}

impl SendResponse {
    /// A success response.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    /// A failure response.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: message.into(),
        }
    }
}
