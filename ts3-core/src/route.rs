//! Routing decisions for events arriving on the SDK notification thread.
//!
//! A server error either answers a correlated request (it carries the token
//! text the bridge handed to the SDK) or reports on an in-flight connect.
//! A status change only ever answers a connect or disconnect.

use crate::state::ExpectedState;
use ts3_types::{ConnectStatus, CorrelationToken, ReturnCode};

/// Where a server error event should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRoute {
    /// Outcome of the correlated request holding this token.
    Correlated(CorrelationToken),
    /// No token: an out-of-band error about the connection lifecycle.
    Lifecycle,
    /// Token text present but not a positive number. Dropped.
    Malformed,
}

impl ErrorRoute {
    /// Classify the return-code text attached to a server error event.
    ///
    /// Empty text counts as no token at all, so it is routed to the
    /// connection lifecycle. A bare C binding that only checks for a null
    /// pointer would parse `""` as token 0 and drop the event instead; the
    /// bridge deliberately lets an empty tag fail a pending connect.
    ///
    /// ```
    /// use ts3bridge_core::ErrorRoute;
    ///
    /// assert!(matches!(ErrorRoute::classify(Some("17")), ErrorRoute::Correlated(_)));
    /// assert_eq!(ErrorRoute::classify(None), ErrorRoute::Lifecycle);
    /// assert_eq!(ErrorRoute::classify(Some("0")), ErrorRoute::Malformed);
    /// ```
    pub fn classify(return_code: Option<&str>) -> Self {
        match return_code {
            None => Self::Lifecycle,
            Some(text) if text.is_empty() => Self::Lifecycle,
            Some(text) => match CorrelationToken::parse(text) {
                Some(token) => Self::Correlated(token),
                None => Self::Malformed,
            },
        }
    }
}

/// Outcome to post for a token-less server error, given the handle's state.
///
/// Only a pending connect is failed by such an error; while idle or
/// disconnecting there is nobody to tell.
pub fn resolve_lifecycle_error(expected: ExpectedState, code: ReturnCode) -> Option<ReturnCode> {
    match expected {
        ExpectedState::Connecting => Some(code),
        ExpectedState::None | ExpectedState::Disconnecting => None,
    }
}

/// Outcome to post for a status change, given the handle's state.
///
/// Only `Disconnected` and `ConnectionEstablished` end a transition. A
/// status that contradicts the pending transition but carries `OK` is
/// rewritten to `UNDEFINED` so the waiter never sees a misleading success.
pub fn resolve_status_change(
    expected: ExpectedState,
    status: ConnectStatus,
    code: ReturnCode,
) -> Option<ReturnCode> {
    if !status.is_terminal() {
        return None;
    }

    let contradicts = match expected {
        ExpectedState::None => return None,
        ExpectedState::Connecting => status == ConnectStatus::Disconnected,
        ExpectedState::Disconnecting => status == ConnectStatus::ConnectionEstablished,
    };

    if contradicts && code.is_ok() {
        Some(ReturnCode::UNDEFINED)
    } else {
        Some(code)
    }
}
