//! Blocking wait primitive.
//!
//! A [`WaitSlot`] holds at most one posted outcome. The outcome and the
//! condition variable share one mutex, so a post that lands between the
//! waiter's check and its sleep is never lost.

use parking_lot::{Condvar, Mutex};
use std::time::Instant;
use ts3_types::ReturnCode;

/// Result of [`WaitSlot::wait_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// An outcome was posted; the slot is empty again.
    Delivered(ReturnCode),
    /// The deadline passed with nothing posted.
    TimedOut,
}

/// One posted-outcome cell plus the condition variable its waiter sleeps on.
///
/// `None` means nothing delivered; `Some` is both the delivered flag and
/// the outcome.
#[derive(Debug, Default)]
pub struct WaitSlot {
    delivered: Mutex<Option<ReturnCode>>,
    cond: Condvar,
}

impl WaitSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Post an outcome and wake the waiter.
    ///
    /// First delivery wins: returns `false` and changes nothing if an
    /// outcome is already waiting to be consumed.
    pub fn post(&self, code: ReturnCode) -> bool {
        let mut delivered = self.delivered.lock();
        if delivered.is_some() {
            return false;
        }
        *delivered = Some(code);
        self.cond.notify_all();
        true
    }

    /// Block until an outcome is posted or `deadline` passes.
    ///
    /// The deadline is absolute; spurious wakeups do not extend it. A
    /// delivered outcome is consumed so the slot can be reused.
    pub fn wait_until(&self, deadline: Instant) -> WaitOutcome {
        let mut delivered = self.delivered.lock();
        while delivered.is_none() {
            if self.cond.wait_until(&mut delivered, deadline).timed_out() {
                break;
            }
        }
        match delivered.take() {
            Some(code) => WaitOutcome::Delivered(code),
            None => WaitOutcome::TimedOut,
        }
    }

    /// Consume a posted outcome without blocking.
    pub fn take(&self) -> Option<ReturnCode> {
        self.delivered.lock().take()
    }

    /// Whether an outcome is waiting to be consumed.
    pub fn is_delivered(&self) -> bool {
        self.delivered.lock().is_some()
    }
}
