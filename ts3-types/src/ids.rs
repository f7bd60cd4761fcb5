//! Identity types for the TeamSpeak client SDK boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Identifier of one server connection handler inside the client library.
///
/// Opaque to the bridge; it keys the connection lifecycle state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    /// Create a handle from the raw id the SDK hands out.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionHandle({})", self.0)
    }
}

/// A client id on a server (the SDK's `anyID`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ClientId(u16);

impl ClientId {
    /// Create a client id from its raw value.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn raw(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

/// A channel id on a server. Zero means "no channel" (e.g. the root parent).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ChannelId(u64);

impl ChannelId {
    /// The root of the channel tree.
    pub const ROOT: ChannelId = ChannelId(0);

    /// Create a channel id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

/// Correlation token threaded through an asynchronous SDK request.
///
/// Always positive, so an absent or zero token is never mistaken for a real
/// one. The SDK sees the decimal text form produced by `Display`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(NonZeroU32);

impl CorrelationToken {
    /// Create a token from a raw value; zero is not a token.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    /// Parse the text echoed back by the SDK.
    ///
    /// Mirrors C `strtol`: leading whitespace is skipped, an optional sign is
    /// accepted, and the leading run of decimal digits is read. Anything that
    /// does not denote a value in `1..=u32::MAX` yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start();
        let (negative, rest) = match rest.as_bytes().first() {
            Some(b'-') => (true, &rest[1..]),
            Some(b'+') => (false, &rest[1..]),
            _ => (false, rest),
        };
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 || negative {
            return None;
        }
        // Overflowing digit runs are not valid tokens either.
        let value: u32 = rest[..digits_len].parse().ok()?;
        Self::new(value)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationToken({})", self.0)
    }
}
