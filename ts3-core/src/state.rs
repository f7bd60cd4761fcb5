//! Expected-transition state machine for a connection handle.
//!
//! A handle is either idle (`None`) or has exactly one connect or disconnect
//! in flight. Transitions start only from `None` and are claimed with a
//! single compare-and-set, so two callers racing on the same handle cannot
//! both proceed to the SDK.
//!
//! ```text
//! None --(begin connect)--------> Connecting
//! Connecting --(outcome)--------> None
//! None --(begin disconnect)-----> Disconnecting
//! Disconnecting --(outcome)-----> None
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

/// What the bridge currently expects the SDK to report for a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ExpectedState {
    /// No transition in flight.
    #[default]
    None = 0,
    /// A connect was issued; waiting for established or an error.
    Connecting = 1,
    /// A disconnect was issued; waiting for disconnected.
    Disconnecting = 2,
}

impl ExpectedState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Disconnecting,
            _ => Self::None,
        }
    }

    /// True when no transition is in flight.
    pub fn is_idle(self) -> bool {
        self == Self::None
    }
}

impl fmt::Display for ExpectedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Connecting => "connecting",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// A lifecycle transition a caller wants to begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Start a connection.
    Connect,
    /// Stop a connection.
    Disconnect,
}

impl Transition {
    /// State the handle is in while this transition is in flight.
    pub fn target(self) -> ExpectedState {
        match self {
            Self::Connect => ExpectedState::Connecting,
            Self::Disconnect => ExpectedState::Disconnecting,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// A transition could not begin because another one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {attempted} while {current}")]
pub struct TransitionRejected {
    /// What the caller tried.
    pub attempted: Transition,
    /// The state observed by the failed compare-and-set.
    pub current: ExpectedState,
}

/// Atomic holder of an [`ExpectedState`].
#[derive(Debug, Default)]
pub struct ExpectedStateCell(AtomicU8);

impl ExpectedStateCell {
    /// Create an idle cell.
    pub fn new() -> Self {
        Self(AtomicU8::new(ExpectedState::None as u8))
    }

    /// Current state.
    pub fn load(&self) -> ExpectedState {
        ExpectedState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Claim `transition`, moving `None` to its target state.
    pub fn try_begin(&self, transition: Transition) -> Result<(), TransitionRejected> {
        self.0
            .compare_exchange(
                ExpectedState::None as u8,
                transition.target() as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|observed| TransitionRejected {
                attempted: transition,
                current: ExpectedState::from_raw(observed),
            })
    }

    /// Return to `None` unconditionally.
    pub fn reset(&self) {
        self.0.store(ExpectedState::None as u8, Ordering::Release);
    }
}
