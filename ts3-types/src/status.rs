//! Connection status as reported by the status-change event.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a server connection handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ConnectStatus {
    /// No connection, or the connection went away.
    Disconnected = 0,
    /// Connection attempt started.
    Connecting = 1,
    /// Transport connected, handshake still running.
    Connected = 2,
    /// Receiving the initial server state.
    ConnectionEstablishing = 3,
    /// Fully connected.
    ConnectionEstablished = 4,
}

impl ConnectStatus {
    /// Raw value as used by the SDK.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Whether the bridge considers this status an end state of a transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::ConnectionEstablished)
    }
}

impl TryFrom<i32> for ConnectStatus {
    type Error = TypesError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Disconnected),
            1 => Ok(Self::Connecting),
            2 => Ok(Self::Connected),
            3 => Ok(Self::ConnectionEstablishing),
            4 => Ok(Self::ConnectionEstablished),
            other => Err(TypesError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ConnectionEstablishing => "establishing",
            Self::ConnectionEstablished => "established",
        };
        f.write_str(s)
    }
}
