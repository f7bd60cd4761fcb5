//! The synchronous bridge: shared state for one initialised client library.
//!
//! A [`SyncBridge`] owns the correlation registry and the connection table.
//! Caller threads enter through `begin_correlated`, `begin_connect` and
//! `begin_disconnect` and block there; the SDK notification thread enters
//! through the [`EventBridge`] returned by [`SyncBridge::event_sink`].

use crate::config::BridgeConfig;
use crate::connections::{ConnectionRecord, ConnectionTable};
use crate::error::CallError;
use crate::events::EventBridge;
use crate::registry::CorrelationRegistry;
use crate::sdk::ClientEvents;
use crate::wait::WaitOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};
use ts3_core::Transition;
use ts3_types::{ConnectionHandle, ReturnCode};

/// What [`SyncBridge::shutdown`] cleared out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Correlated requests still pending.
    pub pending: usize,
    /// Connection records dropped.
    pub connections: usize,
    /// Blocked callers woken with `CONNECTION_LOST`.
    pub woken: usize,
}

/// Shared bridge context.
#[derive(Debug)]
pub struct SyncBridge {
    pub(crate) registry: CorrelationRegistry,
    pub(crate) connections: ConnectionTable,
    wait_timeout: Duration,
}

impl SyncBridge {
    /// Create a bridge using the configured deadline.
    pub fn new(config: &BridgeConfig) -> Arc<Self> {
        Self::with_timeout(config.wait_timeout())
    }

    /// Create a bridge with an explicit deadline.
    pub fn with_timeout(wait_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: CorrelationRegistry::new(),
            connections: ConnectionTable::new(),
            wait_timeout,
        })
    }

    /// Callback sink to register with the client library.
    pub fn event_sink(self: &Arc<Self>) -> Arc<dyn ClientEvents> {
        Arc::new(EventBridge::new(Arc::clone(self)))
    }

    /// Per-call deadline.
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// The correlation registry.
    pub fn registry(&self) -> &CorrelationRegistry {
        &self.registry
    }

    /// The connection state table.
    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Run a correlated request and block for its outcome.
    ///
    /// `op` receives the token text to pass to the SDK and returns the
    /// SDK's synchronous code. A non-ok code is returned as a rejection
    /// without waiting. On timeout the token is withdrawn, so a late event
    /// finds nothing and is dropped.
    pub fn begin_correlated<F>(&self, op: F) -> Result<(), CallError>
    where
        F: FnOnce(&str) -> ReturnCode,
    {
        let deadline = Instant::now() + self.wait_timeout;
        let pending = self.registry.allocate();
        let token = pending.token();

        let code = op(pending.token_text());
        if !code.is_ok() {
            if let Some(record) = self.registry.remove(token) {
                self.registry.release(record);
            }
            tracing::debug!("request {} rejected: {}", token, code);
            return Err(CallError::Rejected { code });
        }

        match pending.slot().wait_until(deadline) {
            WaitOutcome::Delivered(code) => outcome(code),
            WaitOutcome::TimedOut => {
                if let Some(record) = self.registry.remove(token) {
                    self.registry.release(record);
                    tracing::warn!(
                        "request {} timed out after {:?}",
                        token,
                        self.wait_timeout
                    );
                    return Err(CallError::TimedOut {
                        timeout: self.wait_timeout,
                    });
                }
                // The event thread claimed the token at the deadline; its
                // post may already be in.
                match pending.slot().take() {
                    Some(code) => outcome(code),
                    None => Err(CallError::TimedOut {
                        timeout: self.wait_timeout,
                    }),
                }
            }
        }
    }

    /// Start a connection on `handle` and block until it is established
    /// or fails. `op` issues the SDK connect call.
    pub fn begin_connect<F>(&self, handle: ConnectionHandle, op: F) -> Result<(), CallError>
    where
        F: FnOnce() -> ReturnCode,
    {
        self.begin_transition(handle, Transition::Connect, op)
    }

    /// Stop the connection on `handle` and block until it is gone.
    /// `op` issues the SDK disconnect call.
    pub fn begin_disconnect<F>(&self, handle: ConnectionHandle, op: F) -> Result<(), CallError>
    where
        F: FnOnce() -> ReturnCode,
    {
        self.begin_transition(handle, Transition::Disconnect, op)
    }

    fn begin_transition<F>(
        &self,
        handle: ConnectionHandle,
        transition: Transition,
        op: F,
    ) -> Result<(), CallError>
    where
        F: FnOnce() -> ReturnCode,
    {
        let deadline = Instant::now() + self.wait_timeout;
        let record = self.connections.get_or_create(handle);

        let guard = record.begin(transition).map_err(|rejected| {
            tracing::warn!("handle {}: {}", handle, rejected);
            CallError::CurrentlyNotPossible {
                current: rejected.current,
            }
        })?;

        let code = op();
        if !code.is_ok() {
            tracing::debug!("handle {}: {} rejected: {}", handle, transition, code);
            return Err(CallError::Rejected { code });
        }

        let result = self.await_record(guard.record(), deadline, transition);
        drop(guard);
        result
    }

    fn await_record(
        &self,
        record: &ConnectionRecord,
        deadline: Instant,
        transition: Transition,
    ) -> Result<(), CallError> {
        match record.slot().wait_until(deadline) {
            WaitOutcome::Delivered(code) => {
                tracing::debug!("handle {}: {} finished: {}", record.handle(), transition, code);
                outcome(code)
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    "handle {}: {} timed out after {:?}",
                    record.handle(),
                    transition,
                    self.wait_timeout
                );
                Err(CallError::TimedOut {
                    timeout: self.wait_timeout,
                })
            }
        }
    }

    /// Forget the record for `handle` after its handler was destroyed.
    pub fn delete_connection(&self, handle: ConnectionHandle) -> bool {
        self.connections.delete(handle)
    }

    /// Drain both collections, waking every blocked caller with
    /// `CONNECTION_LOST`. Safe to call more than once.
    pub fn shutdown(&self) -> DrainReport {
        let mut report = DrainReport::default();

        for pending in self.registry.drain() {
            report.pending += 1;
            if pending.slot().post(ReturnCode::CONNECTION_LOST) {
                report.woken += 1;
            }
            self.registry.release(pending);
        }

        for record in self.connections.drain() {
            report.connections += 1;
            if !record.expected().is_idle() && record.slot().post(ReturnCode::CONNECTION_LOST) {
                report.woken += 1;
            }
        }

        if report != DrainReport::default() {
            tracing::debug!(
                "bridge drained: {} pending, {} connections, {} woken",
                report.pending,
                report.connections,
                report.woken
            );
        }
        report
    }
}

fn outcome(code: ReturnCode) -> Result<(), CallError> {
    if code.is_ok() {
        Ok(())
    } else {
        Err(CallError::Failed { code })
    }
}
