//! Fully qualified addresses on the messaging network.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Server used for regular user accounts.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";

/// A `user@server` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid {
    /// Local part, e.g. the phone number.
    pub user: String,
    /// Addressing domain.
    pub server: String,
}

impl Jid {
    /// Create an address from its parts.
    #[must_use]
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Qualify a bare identifier with the default user server.
    #[must_use]
    pub fn user(user: impl Into<String>) -> Self {
        Self::new(user, DEFAULT_USER_SERVER)
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

/// Error parsing a [`Jid`].
#[derive(Debug, thiserror::Error)]
#[error("Invalid address: {0}")]
pub struct ParseJidError(String);

impl FromStr for Jid {
    type Err = ParseJidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((user, server)) if !server.is_empty() => Ok(Self::new(user, server)),
            _ => Err(ParseJidError(s.to_string())),
        }
    }
}
