//! Correlation registry: pending requests keyed by token.
//!
//! `remove` is the claim: whoever removes a record (the event bridge on
//! delivery, or the caller on rejection/timeout) owns the right to act on
//! it, and no one else can find it afterwards.

use crate::wait::WaitSlot;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use ts3_types::CorrelationToken;

/// Bookkeeping for one outstanding correlated call.
#[derive(Debug)]
pub struct PendingRequest {
    token: CorrelationToken,
    token_text: String,
    slot: WaitSlot,
}

impl PendingRequest {
    fn new(token: CorrelationToken) -> Self {
        Self {
            token,
            token_text: token.to_string(),
            slot: WaitSlot::new(),
        }
    }

    /// The token.
    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Decimal text handed to the SDK as the return code.
    pub fn token_text(&self) -> &str {
        &self.token_text
    }

    /// Where the outcome is posted.
    pub fn slot(&self) -> &WaitSlot {
        &self.slot
    }
}

/// Pending correlated requests.
#[derive(Debug)]
pub struct CorrelationRegistry {
    next: AtomicU32,
    pending: DashMap<CorrelationToken, Arc<PendingRequest>>,
}

impl CorrelationRegistry {
    /// Create an empty registry; the first token is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
            pending: DashMap::new(),
        }
    }

    /// Mint a fresh token and register a record for it.
    ///
    /// Zero is skipped when the counter wraps, and a token still pending
    /// from a previous lap is never handed out twice.
    pub fn allocate(&self) -> Arc<PendingRequest> {
        loop {
            let raw = self.next.fetch_add(1, Ordering::Relaxed);
            let Some(token) = CorrelationToken::new(raw) else {
                continue;
            };
            if let Entry::Vacant(slot) = self.pending.entry(token) {
                let record = Arc::new(PendingRequest::new(token));
                slot.insert(Arc::clone(&record));
                tracing::debug!("allocated correlation token {}", token);
                return record;
            }
        }
    }

    /// Unlink the record for `token`, if it is still pending.
    pub fn remove(&self, token: CorrelationToken) -> Option<Arc<PendingRequest>> {
        self.pending.remove(&token).map(|(_, record)| record)
    }

    /// Drop a record that has already been unlinked.
    pub fn release(&self, record: Arc<PendingRequest>) {
        debug_assert!(
            !self.pending.contains_key(&record.token),
            "released token {} is still registered",
            record.token
        );
        drop(record);
    }

    /// Whether `token` is still pending.
    pub fn contains(&self, token: CorrelationToken) -> bool {
        self.pending.contains_key(&token)
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Unlink every pending record.
    pub fn drain(&self) -> Vec<Arc<PendingRequest>> {
        let tokens: Vec<CorrelationToken> = self.pending.iter().map(|e| *e.key()).collect();
        tokens
            .into_iter()
            .filter_map(|token| self.remove(token))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set_next(&self, raw: u32) {
        self.next.store(raw, Ordering::Relaxed);
    }
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
