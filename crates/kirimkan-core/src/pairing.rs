//! Events surfaced while pairing a new device.

use std::{fmt, time::Duration};

/// An item on the pairing-event stream.
///
/// Every variant except [`PairingEvent::Code`] ends the pairing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingEvent {
    /// A fresh pairing code; supersedes any earlier one.
    Code {
        /// Payload to render as a scannable code.
        code: String,
        /// How long the network honours this code.
        timeout: Duration,
    },
    /// The device was paired and its identity persisted.
    Success,
    /// Every issued code expired without being scanned.
    Timeout,
    /// The network rejected the client version.
    ClientOutdated,
    /// The code was scanned by a phone without multi-device support.
    ScannedWithoutMultidevice,
    /// Pairing was requested while the client was already paired or connected.
    UnexpectedState,
    /// Any other pairing failure.
    Error(String),
}

impl PairingEvent {
    /// Whether this event resolves the pairing attempt.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Code { .. })
    }

    /// Short event name, as used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Code { .. } => "code",
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::ClientOutdated => "err-client-outdated",
            Self::ScannedWithoutMultidevice => "err-scanned-without-multidevice",
            Self::UnexpectedState => "err-unexpected-state",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for PairingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(reason) => write!(f, "{}: {reason}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}
