//! Connection state table: per-handle lifecycle records.

use crate::wait::WaitSlot;
use dashmap::DashMap;
use std::sync::Arc;
use ts3_core::{ExpectedState, ExpectedStateCell, Transition, TransitionRejected};
use ts3_types::ConnectionHandle;

/// Lifecycle bookkeeping for one connection handle.
#[derive(Debug)]
pub struct ConnectionRecord {
    handle: ConnectionHandle,
    state: ExpectedStateCell,
    slot: WaitSlot,
}

impl ConnectionRecord {
    fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: ExpectedStateCell::new(),
            slot: WaitSlot::new(),
        }
    }

    /// The handle this record tracks.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    /// Transition currently in flight, if any.
    pub fn expected(&self) -> ExpectedState {
        self.state.load()
    }

    /// Where connect/disconnect outcomes are posted.
    pub fn slot(&self) -> &WaitSlot {
        &self.slot
    }

    /// Claim a transition. The returned guard puts the record back to
    /// `None` when dropped, whatever the outcome.
    ///
    /// Any outcome already posted by an earlier transition that timed out is
    /// discarded. An event that read the old expected state before this call
    /// but posts after it still lands in the slot and answers this one.
    pub fn begin(
        self: &Arc<Self>,
        transition: Transition,
    ) -> Result<TransitionGuard, TransitionRejected> {
        self.state.try_begin(transition)?;
        if let Some(stale) = self.slot.take() {
            tracing::debug!("handle {}: discarded stale outcome {}", self.handle, stale);
        }
        tracing::debug!("handle {}: {} begins", self.handle, transition);
        Ok(TransitionGuard {
            record: Arc::clone(self),
        })
    }
}

/// Holds a claimed transition; resets the record's state on drop.
#[derive(Debug)]
pub struct TransitionGuard {
    record: Arc<ConnectionRecord>,
}

impl TransitionGuard {
    /// The record whose transition is held.
    pub fn record(&self) -> &Arc<ConnectionRecord> {
        &self.record
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.record.state.reset();
    }
}

/// Connection records keyed by handle.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    records: DashMap<ConnectionHandle, Arc<ConnectionRecord>>,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing record for `handle`, or a new idle one.
    pub fn get_or_create(&self, handle: ConnectionHandle) -> Arc<ConnectionRecord> {
        let entry = self
            .records
            .entry(handle)
            .or_insert_with(|| Arc::new(ConnectionRecord::new(handle)));
        Arc::clone(entry.value())
    }

    /// Existing record for `handle`; never creates one.
    pub fn get(&self, handle: ConnectionHandle) -> Option<Arc<ConnectionRecord>> {
        self.records.get(&handle).map(|e| Arc::clone(e.value()))
    }

    /// Forget `handle`. Returns whether a record existed.
    pub fn delete(&self, handle: ConnectionHandle) -> bool {
        match self.records.remove(&handle) {
            Some((_, record)) => {
                if !record.expected().is_idle() {
                    tracing::warn!(
                        "handle {} deleted while {}",
                        handle,
                        record.expected()
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no handle is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unlink every record.
    pub fn drain(&self) -> Vec<Arc<ConnectionRecord>> {
        let handles: Vec<ConnectionHandle> = self.records.iter().map(|e| *e.key()).collect();
        handles
            .into_iter()
            .filter_map(|h| self.records.remove(&h).map(|(_, record)| record))
            .collect()
    }
}
