//! Error types for ts3bridge.
//!
//! Every failed call flattens to exactly one SDK result code via
//! [`CallError::code`], so a host binding can hand callers the same integer
//! the native library would have produced.

use std::time::Duration;
use thiserror::Error;
use ts3_core::ExpectedState;
use ts3_types::ReturnCode;

/// Why a bridged call did not end in `ERROR_ok`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The SDK refused the request synchronously; nothing was awaited.
    #[error("rejected by client library: {code}")]
    Rejected {
        /// Code returned by the SDK entry point.
        code: ReturnCode,
    },

    /// The SDK accepted the request and later reported failure.
    #[error("failed: {code}")]
    Failed {
        /// Code delivered by the event.
        code: ReturnCode,
    },

    /// No outcome arrived before the deadline.
    #[error("no outcome within {timeout:?}")]
    TimedOut {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// Another connect or disconnect is in flight on this handle.
    #[error("currently not possible: handle is {current}")]
    CurrentlyNotPossible {
        /// State observed when the transition was refused.
        current: ExpectedState,
    },
}

impl CallError {
    /// Result code a caller of the native API would have seen.
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::Rejected { code } | Self::Failed { code } => *code,
            Self::TimedOut { .. } => ReturnCode::CONNECTION_LOST,
            Self::CurrentlyNotPossible { .. } => ReturnCode::CURRENTLY_NOT_POSSIBLE,
        }
    }

    /// True when the SDK never went asynchronous.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::CurrentlyNotPossible { .. })
    }
}

/// Collapse a call result into the single final result code.
pub fn final_code<T>(result: &Result<T, CallError>) -> ReturnCode {
    match result {
        Ok(_) => ReturnCode::OK,
        Err(e) => e.code(),
    }
}

/// Errors bringing the bridge up.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The client library refused to initialise.
    #[error("client library init failed: {code}")]
    InitFailed {
        /// Code returned by `init`.
        code: ReturnCode,
    },
}
